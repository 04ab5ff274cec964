//! Error types for mf-scan

use mf_core::StoreError;
use mf_db::DbError;
use thiserror::Error;

/// Scan errors that abort a whole operation.
///
/// Per-table failures are not errors at this level; they are recorded on the
/// table's description and reported in the scan report.
#[derive(Error, Debug)]
pub enum ScanError {
    /// S101: Engine connection is unusable
    #[error("[S101] Engine failure: {0}")]
    Engine(#[from] DbError),

    /// S102: Description store failed
    #[error("[S102] Store failure: {0}")]
    Store(#[from] StoreError),

    /// S103: Requested table id is not stored
    #[error("[S103] Unknown table description id {0}")]
    UnknownTable(i64),
}

/// Result type alias for ScanError
pub type ScanResult<T> = Result<T, ScanError>;
