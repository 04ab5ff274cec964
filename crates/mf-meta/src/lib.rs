//! Metadata store for Manifold.
//!
//! Provides a DuckDB-backed implementation of the table description and
//! manifest stores, with embedded schema migrations.

pub mod connection;
pub mod ddl;
pub mod descriptions;
pub mod error;
pub mod manifests;

pub use connection::MetaDb;
pub use error::{MetaError, MetaResult};
