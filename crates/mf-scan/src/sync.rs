//! Lifecycle bookkeeping between the live schema and stored descriptions.

use crate::error::{ScanError, ScanResult};
use crate::scanner::{ScanReport, SchemaScanner};
use mf_core::{SyncStatus, TableDescription, TableKey};
use std::collections::BTreeSet;

/// Outcome of [`SyncStateTracker::refresh`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Live relations seen for the first time, now `NOT_SCANNED`
    pub inserted: Vec<TableKey>,
    /// Stored tables missing from the live schema, now `DEPRECATED`
    pub deprecated: Vec<TableKey>,
    /// Rows left as they were
    pub unchanged: usize,
}

/// Drives table descriptions through their sync states
pub struct SyncStateTracker<'a> {
    scanner: SchemaScanner<'a>,
}

impl<'a> SyncStateTracker<'a> {
    pub fn new(scanner: SchemaScanner<'a>) -> Self {
        Self { scanner }
    }

    /// Reconcile stored descriptions of `connection_id`/`schema` with the
    /// live schema.
    ///
    /// New relations (tables and views) are inserted as `NOT_SCANNED`; stored
    /// rows whose relation vanished become `DEPRECATED`. Everything else,
    /// including a deprecated table that reappeared, is left untouched.
    pub async fn refresh(&self, connection_id: &str, schema: &str) -> ScanResult<RefreshReport> {
        let engine = self.scanner.engine();
        let store = self.scanner.store();

        let live: BTreeSet<String> = engine
            .list_relations(schema)
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect();
        let stored = store.list_descriptions(connection_id, schema)?;
        let known: BTreeSet<&str> = stored.iter().map(|d| d.table_name()).collect();

        let mut report = RefreshReport::default();

        for name in &live {
            if known.contains(name.as_str()) {
                continue;
            }
            let desc = TableDescription::discovered(TableKey::new(connection_id, schema, name));
            store.upsert_description(&desc)?;
            report.inserted.push(desc.key);
        }

        let mut vanished = Vec::new();
        for desc in &stored {
            let gone = !live.contains(desc.table_name());
            if gone && desc.sync_status != SyncStatus::Deprecated {
                if let Some(id) = desc.id {
                    vanished.push(id);
                    report.deprecated.push(desc.key.clone());
                }
            } else {
                report.unchanged += 1;
            }
        }
        if !vanished.is_empty() {
            store.set_sync_status(&vanished, SyncStatus::Deprecated)?;
        }

        log::info!(
            "Refreshed {}:{}: {} new, {} deprecated, {} unchanged",
            connection_id,
            schema,
            report.inserted.len(),
            report.deprecated.len(),
            report.unchanged
        );
        Ok(report)
    }

    /// Mark the given rows `SYNCHRONIZING` and return them as scan targets.
    ///
    /// Every id is checked before anything is written, so an unknown id
    /// leaves all rows untouched.
    pub fn begin_scan(&self, ids: &[i64]) -> ScanResult<Vec<TableDescription>> {
        let store = self.scanner.store();
        let mut targets = Vec::with_capacity(ids.len());
        for &id in ids {
            let desc = store
                .get_description_by_id(id)?
                .ok_or(ScanError::UnknownTable(id))?;
            targets.push(desc);
        }

        store.set_sync_status(ids, SyncStatus::Synchronizing)?;

        for desc in &mut targets {
            desc.sync_status = SyncStatus::Synchronizing;
        }
        Ok(targets)
    }

    /// [`begin_scan`](Self::begin_scan) followed by a scanner run
    pub async fn scan_tables(&self, ids: &[i64]) -> ScanResult<ScanReport> {
        let targets = self.begin_scan(ids)?;
        self.scanner.scan(targets).await
    }

    /// All stored descriptions of `connection_id`/`schema`
    pub fn descriptions(
        &self,
        connection_id: &str,
        schema: &str,
    ) -> ScanResult<Vec<TableDescription>> {
        Ok(self.scanner.store().list_descriptions(connection_id, schema)?)
    }
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
