//! [`TableDescriptionStore`] over `mf_meta.table_descriptions`.

use crate::connection::{format_timestamp, next_id, parse_timestamp, MetaDb};
use crate::error::{MetaError, MetaResult, MetaResultExt};
use duckdb::{Connection, Row};
use mf_core::{StoreResult, SyncStatus, TableDescription, TableDescriptionStore, TableKey};
use std::str::FromStr;

const SELECT_COLUMNS: &str = "SELECT table_description_id, connection_id, schema_name, table_name, \
     sync_status, columns_json, ddl, examples_json, last_sync, error_message, description \
     FROM mf_meta.table_descriptions";

/// Raw column values of one row, before JSON and enum decoding
struct DescriptionRow {
    id: i64,
    connection_id: String,
    schema: String,
    table_name: String,
    sync_status: String,
    columns_json: String,
    ddl: Option<String>,
    examples_json: String,
    last_sync: Option<String>,
    error_message: Option<String>,
    description: Option<String>,
}

impl DescriptionRow {
    fn read(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            connection_id: row.get(1)?,
            schema: row.get(2)?,
            table_name: row.get(3)?,
            sync_status: row.get(4)?,
            columns_json: row.get(5)?,
            ddl: row.get(6)?,
            examples_json: row.get(7)?,
            last_sync: row.get(8)?,
            error_message: row.get(9)?,
            description: row.get(10)?,
        })
    }

    fn decode(self) -> MetaResult<TableDescription> {
        let key = TableKey::new(self.connection_id, self.schema, self.table_name);
        let corrupt = |what: &str, e: &dyn std::fmt::Display| {
            MetaError::DecodeError(format!("{what} of {key}: {e}"))
        };
        let sync_status =
            SyncStatus::from_str(&self.sync_status).map_err(|e| corrupt("sync_status", &e))?;
        let columns =
            serde_json::from_str(&self.columns_json).map_err(|e| corrupt("columns", &e))?;
        let examples =
            serde_json::from_str(&self.examples_json).map_err(|e| corrupt("examples", &e))?;
        let last_sync = self.last_sync.as_deref().map(parse_timestamp).transpose()?;

        Ok(TableDescription {
            id: Some(self.id),
            key,
            sync_status,
            columns,
            ddl: self.ddl,
            examples,
            last_sync,
            error_message: self.error_message,
            description: self.description,
        })
    }
}

fn find_id(conn: &Connection, key: &TableKey) -> MetaResult<Option<i64>> {
    let mut stmt = conn
        .prepare(
            "SELECT table_description_id FROM mf_meta.table_descriptions \
             WHERE connection_id = ? AND schema_name = ? AND table_name = ?",
        )
        .query_context("prepare description lookup")?;
    let mut rows = stmt
        .query(duckdb::params![key.connection_id, key.schema, key.table_name])
        .query_context("description lookup")?;
    match rows.next().query_context("description lookup")? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

fn upsert(conn: &Connection, desc: &TableDescription) -> MetaResult<i64> {
    let columns_json = serde_json::to_string(&desc.columns)
        .map_err(|e| MetaError::QueryError(format!("serialize columns: {e}")))?;
    let examples_json = serde_json::to_string(&desc.examples)
        .map_err(|e| MetaError::QueryError(format!("serialize examples: {e}")))?;
    let last_sync = desc.last_sync.as_ref().map(format_timestamp);

    let existing = match desc.id {
        Some(id) => Some(id),
        None => find_id(conn, &desc.key)?,
    };

    match existing {
        Some(id) => {
            let updated = conn
                .execute(
                    "UPDATE mf_meta.table_descriptions SET sync_status = ?, columns_json = ?, \
                     ddl = ?, examples_json = ?, last_sync = ?, error_message = ?, description = ? \
                     WHERE table_description_id = ?",
                    duckdb::params![
                        desc.sync_status.as_str(),
                        columns_json,
                        desc.ddl,
                        examples_json,
                        last_sync,
                        desc.error_message,
                        desc.description,
                        id,
                    ],
                )
                .query_context("update table_descriptions")?;
            if updated == 0 {
                return Err(MetaError::NotFound {
                    kind: "table description",
                    id,
                });
            }
            Ok(id)
        }
        None => {
            let id = next_id(conn, "mf_meta.table_description_id_seq")?;
            conn.execute(
                "INSERT INTO mf_meta.table_descriptions (table_description_id, connection_id, \
                 schema_name, table_name, sync_status, columns_json, ddl, examples_json, \
                 last_sync, error_message, description) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                duckdb::params![
                    id,
                    desc.key.connection_id,
                    desc.key.schema,
                    desc.key.table_name,
                    desc.sync_status.as_str(),
                    columns_json,
                    desc.ddl,
                    examples_json,
                    last_sync,
                    desc.error_message,
                    desc.description,
                ],
            )
            .query_context("insert table_descriptions")?;
            Ok(id)
        }
    }
}

impl MetaDb {
    fn query_descriptions(
        &self,
        filter: &str,
        params: &[&dyn duckdb::ToSql],
    ) -> MetaResult<Vec<TableDescription>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{SELECT_COLUMNS} WHERE {filter} ORDER BY table_name"))
            .query_context("prepare table_descriptions select")?;
        let rows = stmt
            .query_map(params, DescriptionRow::read)
            .query_context("select table_descriptions")?
            .collect::<Result<Vec<_>, _>>()
            .query_context("read table_descriptions")?;
        rows.into_iter().map(DescriptionRow::decode).collect()
    }
}

impl TableDescriptionStore for MetaDb {
    fn upsert_description(&self, desc: &TableDescription) -> StoreResult<i64> {
        let id = self.transaction(|conn| upsert(conn, desc))?;
        log::debug!("Upserted {} as {} ({})", desc.key, id, desc.sync_status);
        Ok(id)
    }

    fn get_description(&self, key: &TableKey) -> StoreResult<Option<TableDescription>> {
        let mut found = self.query_descriptions(
            "connection_id = ? AND schema_name = ? AND table_name = ?",
            duckdb::params![key.connection_id, key.schema, key.table_name],
        )?;
        Ok(found.pop())
    }

    fn list_descriptions(
        &self,
        connection_id: &str,
        schema: &str,
    ) -> StoreResult<Vec<TableDescription>> {
        Ok(self.query_descriptions(
            "connection_id = ? AND schema_name = ?",
            duckdb::params![connection_id, schema],
        )?)
    }

    fn get_description_by_id(&self, id: i64) -> StoreResult<Option<TableDescription>> {
        let mut found =
            self.query_descriptions("table_description_id = ?", duckdb::params![id])?;
        Ok(found.pop())
    }

    fn set_sync_status(&self, ids: &[i64], status: SyncStatus) -> StoreResult<usize> {
        let updated = self.transaction(|conn| {
            let mut total = 0;
            for &id in ids {
                total += conn
                    .execute(
                        "UPDATE mf_meta.table_descriptions SET sync_status = ? \
                         WHERE table_description_id = ?",
                        duckdb::params![status.as_str(), id],
                    )
                    .query_context("update sync_status")?;
            }
            Ok(total)
        })?;
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "descriptions_test.rs"]
mod tests;
