//! Metadata database connection wrapper.
//!
//! [`MetaDb`] owns a DuckDB [`Connection`] and provides helpers for opening,
//! migrating, and transacting against the metadata database.
//!
//! Applied migration versions live in `mf_meta.schema_version`. Each pending
//! migration runs in the same transaction as its version row, so a failed
//! migration leaves neither partial DDL nor a recorded version behind.

use crate::ddl::{Migration, MIGRATIONS};
use crate::error::{MetaError, MetaResult};
use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::Connection;
use std::path::Path;

/// Wrapper around a DuckDB connection to the metadata database.
///
/// Single-threaded; callers serialize access.
pub struct MetaDb {
    conn: Connection,
}

impl MetaDb {
    /// Open (or create) the metadata database at `path` and run pending
    /// migrations. Missing parent directories are created.
    pub fn open(path: &Path) -> MetaResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| MetaError::ConnectionError(format!("{e}: {}", parent.display())))?;
        }
        let conn = Connection::open(path)
            .map_err(|e| MetaError::ConnectionError(format!("{e}: {}", path.display())))?;
        apply_migrations(&conn, MIGRATIONS)?;
        Ok(Self { conn })
    }

    /// Create an in-memory metadata database with all migrations applied.
    pub fn open_memory() -> MetaResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| MetaError::ConnectionError(e.to_string()))?;
        apply_migrations(&conn, MIGRATIONS)?;
        Ok(Self { conn })
    }

    /// Borrow the underlying DuckDB connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Highest applied migration version
    pub fn schema_version(&self) -> MetaResult<i32> {
        schema_version(&self.conn)
    }

    /// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
    /// error.
    pub fn transaction<F, T>(&self, body: F) -> MetaResult<T>
    where
        F: FnOnce(&Connection) -> MetaResult<T>,
    {
        in_transaction(&self.conn, body)
    }
}

fn in_transaction<F, T>(conn: &Connection, body: F) -> MetaResult<T>
where
    F: FnOnce(&Connection) -> MetaResult<T>,
{
    conn.execute_batch("BEGIN TRANSACTION")
        .map_err(|e| MetaError::TransactionError(format!("BEGIN failed: {e}")))?;

    let result = body(conn);

    match &result {
        Ok(_) => {
            if let Err(commit_err) = conn.execute_batch("COMMIT") {
                let _ = conn.execute_batch("ROLLBACK");
                return Err(MetaError::TransactionError(format!(
                    "COMMIT failed: {commit_err}"
                )));
            }
        }
        Err(_) => {
            let _ = conn.execute_batch("ROLLBACK");
        }
    }
    result
}

fn schema_version(conn: &Connection) -> MetaResult<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM mf_meta.schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| MetaError::MigrationError(format!("failed to read schema version: {e}")))
}

/// Bring `conn` up to the newest of `migrations`.
///
/// A store already past the newest known version was written by a newer
/// build and is refused rather than used with a schema this code can't read.
pub(crate) fn apply_migrations(conn: &Connection, migrations: &[Migration]) -> MetaResult<()> {
    conn.execute_batch(
        "CREATE SCHEMA IF NOT EXISTS mf_meta;
         CREATE TABLE IF NOT EXISTS mf_meta.schema_version (
             version    INTEGER PRIMARY KEY,
             applied_at VARCHAR NOT NULL
         );",
    )
    .map_err(|e| MetaError::MigrationError(format!("failed to create schema_version: {e}")))?;

    let current = schema_version(conn)?;
    let newest = migrations.iter().map(|m| m.version).max().unwrap_or(0);
    if current > newest {
        return Err(MetaError::MigrationError(format!(
            "store is at v{current:03} but only migrations up to v{newest:03} are known"
        )));
    }

    for migration in migrations.iter().filter(|m| m.version > current) {
        log::debug!("Applying meta migration v{:03}", migration.version);
        in_transaction(conn, |conn| {
            conn.execute_batch(migration.sql)?;
            conn.execute(
                "INSERT INTO mf_meta.schema_version (version, applied_at) VALUES (?, ?)",
                duckdb::params![migration.version, format_timestamp(&Utc::now())],
            )?;
            Ok(())
        })
        .map_err(|e| {
            MetaError::MigrationError(format!("migration v{:03} failed: {e}", migration.version))
        })?;
    }
    Ok(())
}

/// Draw the next id from a sequence.
pub(crate) fn next_id(conn: &Connection, sequence: &str) -> MetaResult<i64> {
    let id: i64 = conn.query_row(&format!("SELECT nextval('{sequence}')"), [], |row| {
        row.get(0)
    })?;
    Ok(id)
}

/// Timestamps are stored as fixed-width RFC 3339 text so they sort correctly.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(text: &str) -> MetaResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| MetaError::DecodeError(format!("bad timestamp '{text}': {e}")))
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
