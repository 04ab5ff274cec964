//! mf-scan - Schema scanning for Manifold
//!
//! Reflects a live schema through an [`mf_db::Engine`], profiles its columns
//! and keeps the stored table descriptions in step with it.

pub mod ddl;
pub mod error;
pub mod profiler;
pub mod scanner;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ScanError, ScanResult};
pub use profiler::ColumnProfiler;
pub use scanner::{ReflectionCache, ScanReport, SchemaScanner};
pub use sync::{RefreshReport, SyncStateTracker};
