//! mf-db - Engine abstraction layer for Manifold
//!
//! This crate provides the `Engine` trait used for schema reflection,
//! sampling and column statistics, and its DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{
    ColumnStatistics, ColumnType, Engine, ForeignKeyMetadata, ReflectedColumn, RelationInfo,
    RelationKind, SampleRow, SchemaMetadata, TableMetadata,
};
