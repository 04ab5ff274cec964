//! [`ManifestStore`] over `mf_meta.manifests`.
//!
//! The document column holds the internal (snake_case) serde form. The
//! checksum is taken over the canonical wire export, so bookkeeping-only
//! changes (revision, timestamps) do not count as content changes.

use crate::connection::{format_timestamp, next_id, parse_timestamp, MetaDb};
use crate::error::{MetaError, MetaResult, MetaResultExt};
use chrono::Utc;
use duckdb::Row;
use mf_core::codec;
use mf_core::{
    compute_checksum, Manifest, ManifestFilter, ManifestStore, StoreResult, StoredManifest,
};

const SELECT_COLUMNS: &str = "SELECT manifest_id, owner_id, document, checksum, created_at, updated_at \
     FROM mf_meta.manifests";

struct ManifestRow {
    id: i64,
    owner_id: String,
    document: String,
    checksum: String,
    created_at: String,
    updated_at: String,
}

impl ManifestRow {
    fn read(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            document: row.get(2)?,
            checksum: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn decode(self) -> MetaResult<StoredManifest> {
        let manifest: Manifest = serde_json::from_str(&self.document)
            .map_err(|e| MetaError::DecodeError(format!("manifest {}: {e}", self.id)))?;
        Ok(StoredManifest {
            id: self.id,
            owner_id: self.owner_id,
            manifest,
            checksum: Some(self.checksum),
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// Internal document and wire checksum of a manifest
fn serialize(manifest: &Manifest) -> MetaResult<(String, String)> {
    let document = serde_json::to_string(manifest)
        .map_err(|e| MetaError::QueryError(format!("serialize manifest: {e}")))?;
    let wire = codec::to_json(manifest)
        .map_err(|e| MetaError::QueryError(format!("export manifest: {e}")))?;
    Ok((document, compute_checksum(&wire)))
}

impl MetaDb {
    fn query_manifests(
        &self,
        filter: &str,
        suffix: &str,
        params: &[&dyn duckdb::ToSql],
    ) -> MetaResult<Vec<StoredManifest>> {
        let where_clause = if filter.is_empty() {
            String::new()
        } else {
            format!(" WHERE {filter}")
        };
        let mut stmt = self
            .conn()
            .prepare(&format!("{SELECT_COLUMNS}{where_clause} {suffix}"))
            .query_context("prepare manifests select")?;
        let rows = stmt
            .query_map(params, ManifestRow::read)
            .query_context("select manifests")?
            .collect::<Result<Vec<_>, _>>()
            .query_context("read manifests")?;
        rows.into_iter().map(ManifestRow::decode).collect()
    }
}

impl ManifestStore for MetaDb {
    fn get(&self, id: i64) -> StoreResult<Option<StoredManifest>> {
        let mut found = self.query_manifests("manifest_id = ?", "", duckdb::params![id])?;
        Ok(found.pop())
    }

    fn get_by_owner(&self, owner_id: &str) -> StoreResult<Option<StoredManifest>> {
        let mut found = self.query_manifests(
            "owner_id = ?",
            "ORDER BY updated_at DESC, manifest_id DESC LIMIT 1",
            duckdb::params![owner_id],
        )?;
        Ok(found.pop())
    }

    fn list(
        &self,
        filter: &ManifestFilter,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<StoredManifest>> {
        let mut clauses = Vec::new();
        let mut params: Vec<&dyn duckdb::ToSql> = Vec::new();
        if let Some(owner) = &filter.owner_id {
            clauses.push("owner_id = ?");
            params.push(owner);
        }
        if let Some(catalog) = &filter.catalog {
            clauses.push("catalog = ?");
            params.push(catalog);
        }
        if let Some(schema) = &filter.schema {
            clauses.push("schema_name = ?");
            params.push(schema);
        }
        Ok(self.query_manifests(
            &clauses.join(" AND "),
            &format!("ORDER BY updated_at DESC, manifest_id DESC LIMIT {limit} OFFSET {offset}"),
            &params,
        )?)
    }

    fn create(&self, owner_id: &str, manifest: &Manifest) -> StoreResult<i64> {
        let (document, checksum) = serialize(manifest)?;
        let now = format_timestamp(&Utc::now());
        let id = self.transaction(|conn| {
            let id = next_id(conn, "mf_meta.manifest_id_seq")?;
            conn.execute(
                "INSERT INTO mf_meta.manifests (manifest_id, owner_id, catalog, schema_name, \
                 data_source, version, document, checksum, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                duckdb::params![
                    id,
                    owner_id,
                    manifest.catalog,
                    manifest.schema,
                    manifest.data_source,
                    i64::from(manifest.version),
                    document,
                    checksum,
                    now,
                    now,
                ],
            )
            .query_context("insert manifests")?;
            Ok(id)
        })?;
        log::debug!("Created manifest {} for owner '{}'", id, owner_id);
        Ok(id)
    }

    fn update(&self, stored: &StoredManifest) -> StoreResult<()> {
        let manifest = &stored.manifest;
        let (document, checksum) = serialize(manifest)?;
        self.transaction(|conn| {
            let previous: Option<String> = {
                let mut stmt = conn
                    .prepare("SELECT checksum FROM mf_meta.manifests WHERE manifest_id = ?")
                    .query_context("prepare checksum lookup")?;
                let mut rows = stmt
                    .query(duckdb::params![stored.id])
                    .query_context("checksum lookup")?;
                match rows.next().query_context("checksum lookup")? {
                    Some(row) => Some(row.get(0)?),
                    None => None,
                }
            };
            let Some(previous) = previous else {
                return Err(MetaError::NotFound {
                    kind: "manifest",
                    id: stored.id,
                });
            };

            let sql = if previous == checksum {
                "UPDATE mf_meta.manifests SET owner_id = ?, catalog = ?, schema_name = ?, \
                 data_source = ?, version = ?, document = ?, checksum = ? \
                 WHERE manifest_id = ?"
            } else {
                log::debug!("Manifest {} content changed", stored.id);
                "UPDATE mf_meta.manifests SET owner_id = ?, catalog = ?, schema_name = ?, \
                 data_source = ?, version = ?, document = ?, checksum = ?, updated_at = ? \
                 WHERE manifest_id = ?"
            };
            let now = format_timestamp(&Utc::now());
            let version = i64::from(manifest.version);
            let mut params: Vec<&dyn duckdb::ToSql> = vec![
                &stored.owner_id,
                &manifest.catalog,
                &manifest.schema,
                &manifest.data_source,
                &version,
                &document,
                &checksum,
            ];
            if previous != checksum {
                params.push(&now);
            }
            params.push(&stored.id);
            conn.execute(sql, params.as_slice())
                .query_context("update manifests")?;
            Ok(())
        })?;
        Ok(())
    }

    fn delete(&self, id: i64) -> StoreResult<bool> {
        let removed = self
            .conn()
            .execute(
                "DELETE FROM mf_meta.manifests WHERE manifest_id = ?",
                duckdb::params![id],
            )
            .query_context("delete manifests")?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
#[path = "manifests_test.rs"]
mod tests;
