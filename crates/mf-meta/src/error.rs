//! Error types for the metadata store.

use mf_core::StoreError;
use thiserror::Error;

/// Metadata store errors.
#[derive(Error, Debug)]
pub enum MetaError {
    /// Failed to open or create the metadata database (M101).
    #[error("[M101] Meta database connection failed: {0}")]
    ConnectionError(String),

    /// Schema migration failed (M102).
    #[error("[M102] Meta database migration failed: {0}")]
    MigrationError(String),

    /// SQL execution error inside the metadata database (M103).
    #[error("[M103] Meta database query failed: {0}")]
    QueryError(String),

    /// Transaction management error (M104).
    #[error("[M104] Meta database transaction failed: {0}")]
    TransactionError(String),

    /// A stored row could not be decoded (M105).
    #[error("[M105] Meta database row is corrupt: {0}")]
    DecodeError(String),

    /// Row addressed by id does not exist (M106).
    #[error("[M106] No {kind} with id {id}")]
    NotFound { kind: &'static str, id: i64 },

    /// DuckDB driver error with preserved source chain (M107).
    #[error("[M107] DuckDB error")]
    DuckDb(#[source] duckdb::Error),
}

/// Result type alias for [`MetaError`].
pub type MetaResult<T> = Result<T, MetaError>;

impl From<duckdb::Error> for MetaError {
    fn from(err: duckdb::Error) -> Self {
        MetaError::DuckDb(err)
    }
}

impl From<MetaError> for StoreError {
    fn from(err: MetaError) -> Self {
        match err {
            MetaError::DecodeError(msg) => StoreError::Corrupt(msg),
            MetaError::NotFound { kind, id } => StoreError::NotFound { kind, id },
            MetaError::DuckDb(e) => StoreError::Query(e.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// Attach the failing operation to a driver error.
pub(crate) trait MetaResultExt<T> {
    fn query_context(self, what: &str) -> MetaResult<T>;
}

impl<T> MetaResultExt<T> for Result<T, duckdb::Error> {
    fn query_context(self, what: &str) -> MetaResult<T> {
        self.map_err(|e| MetaError::QueryError(format!("{what}: {e}")))
    }
}
