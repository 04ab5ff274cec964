//! Table scanning: reflect once per batch, then describe each table in turn.

use crate::ddl::append_foreign_keys;
use crate::error::ScanResult;
use crate::profiler::ColumnProfiler;
use mf_core::config::ProfilerConfig;
use mf_core::description::MAX_EXAMPLE_ROWS;
use mf_core::{ColumnDescription, ExampleRow, TableDescription, TableDescriptionStore, TableKey};
use mf_db::{DbError, DbResult, Engine, SchemaMetadata, TableMetadata};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Reflected metadata of one schema, valid for a single scan batch.
///
/// Built once at the start of [`SchemaScanner::scan`] and dropped when the
/// batch ends, so later batches always see fresh metadata.
#[derive(Debug)]
pub struct ReflectionCache {
    batch_id: Uuid,
    metadata: SchemaMetadata,
}

impl ReflectionCache {
    /// Reflect `schema` for batch `batch_id`
    pub async fn load(engine: &dyn Engine, schema: &str, batch_id: Uuid) -> DbResult<Self> {
        let metadata = engine.reflect_schema(schema).await?;
        log::debug!(
            "[{}] reflected {} relations in '{}'",
            batch_id,
            metadata.tables.len(),
            schema
        );
        Ok(Self { batch_id, metadata })
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    pub fn table(&self, name: &str) -> Option<&TableMetadata> {
        self.metadata.table(name)
    }
}

/// Outcome of one scan batch
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub batch_id: Uuid,
    pub scanned: Vec<TableKey>,
    pub failed: Vec<(TableKey, String)>,
}

impl ScanReport {
    fn new(batch_id: Uuid) -> Self {
        Self {
            batch_id,
            scanned: Vec::new(),
            failed: Vec::new(),
        }
    }
}

/// Produces one [`TableDescription`] per target table and persists each
/// as soon as it is done.
pub struct SchemaScanner<'a> {
    engine: &'a dyn Engine,
    store: &'a dyn TableDescriptionStore,
    profiler: ColumnProfiler,
    sample_rows: usize,
}

impl<'a> SchemaScanner<'a> {
    pub fn new(engine: &'a dyn Engine, store: &'a dyn TableDescriptionStore) -> Self {
        Self {
            engine,
            store,
            profiler: ColumnProfiler::default(),
            sample_rows: MAX_EXAMPLE_ROWS,
        }
    }

    pub fn with_profiler_config(mut self, config: ProfilerConfig) -> Self {
        self.profiler = ColumnProfiler::new(config);
        self
    }

    /// Rows sampled per table, capped at [`MAX_EXAMPLE_ROWS`]
    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows.min(MAX_EXAMPLE_ROWS);
        self
    }

    pub fn engine(&self) -> &'a dyn Engine {
        self.engine
    }

    pub fn store(&self) -> &'a dyn TableDescriptionStore {
        self.store
    }

    /// Scan `targets` sequentially.
    ///
    /// A table that fails is stored as `FAILED` and the batch moves on. Only
    /// a fatal engine error (see [`DbError::is_fatal`]) or a store failure
    /// stops the batch; the table being scanned is recorded first.
    pub async fn scan(&self, targets: Vec<TableDescription>) -> ScanResult<ScanReport> {
        let batch_id = Uuid::new_v4();
        let mut report = ScanReport::new(batch_id);
        log::info!("[{}] scanning {} tables", batch_id, targets.len());

        let mut caches: BTreeMap<String, Result<ReflectionCache, String>> = BTreeMap::new();

        for mut desc in targets {
            if !caches.contains_key(&desc.key.schema) {
                let loaded = match ReflectionCache::load(self.engine, &desc.key.schema, batch_id)
                    .await
                {
                    Ok(cache) => Ok(cache),
                    Err(e) if e.is_fatal() => {
                        self.record_failure(&mut desc, &e, &mut report)?;
                        return Err(e.into());
                    }
                    Err(e) => Err(e.to_string()),
                };
                caches.insert(desc.key.schema.clone(), loaded);
            }

            let outcome = match caches.get(&desc.key.schema) {
                Some(Ok(cache)) => self.scan_table(cache, &desc).await,
                Some(Err(reflect_error)) => Err(DbError::ExecutionError(format!(
                    "schema reflection failed: {reflect_error}"
                ))),
                None => Err(DbError::ExecutionError("schema was not reflected".into())),
            };

            match outcome {
                Ok((columns, ddl, examples)) => {
                    desc.mark_scanned(columns, ddl, examples);
                    self.store.upsert_description(&desc)?;
                    log::info!("[{}] scanned {}", batch_id, desc.key);
                    report.scanned.push(desc.key);
                }
                Err(e) => {
                    self.record_failure(&mut desc, &e, &mut report)?;
                    if e.is_fatal() {
                        return Err(e.into());
                    }
                }
            }
        }

        Ok(report)
    }

    fn record_failure(
        &self,
        desc: &mut TableDescription,
        error: &DbError,
        report: &mut ScanReport,
    ) -> ScanResult<()> {
        log::warn!("[{}] failed to scan {}: {}", report.batch_id, desc.key, error);
        desc.mark_failed(error.to_string());
        self.store.upsert_description(desc)?;
        report.failed.push((desc.key.clone(), error.to_string()));
        Ok(())
    }

    async fn scan_table(
        &self,
        cache: &ReflectionCache,
        desc: &TableDescription,
    ) -> DbResult<(Vec<ColumnDescription>, String, Vec<ExampleRow>)> {
        let reflected = cache
            .table(desc.table_name())
            .ok_or_else(|| DbError::TableNotFound(desc.key.to_string()))?;

        let mut table = reflected.clone();
        table.columns.retain(|c| {
            if c.column_type.is_supported() {
                return true;
            }
            log::warn!(
                "[{}] {}: dropping column '{}' of unsupported type '{}'",
                cache.batch_id(),
                desc.key,
                c.name,
                c.column_type.name()
            );
            false
        });

        let ddl = append_foreign_keys(
            &self.engine.compile_create_table(&table),
            &table.foreign_keys,
        );

        let names: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();
        let examples = self
            .engine
            .sample_rows(&table, &names, self.sample_rows)
            .await?;

        let mut columns = Vec::with_capacity(table.columns.len());
        for column in &table.columns {
            let profile = self.profiler.profile(self.engine, &table, &column.name).await?;
            let mut described =
                ColumnDescription::new(&column.name, column.column_type.name()).with_profile(profile);
            if table.is_primary_key(&column.name) {
                described = described.primary_key();
            }
            if let Some((target, target_column)) = table.foreign_key_for(&column.name) {
                described = described.references(target, target_column);
            }
            columns.push(described);
        }

        Ok((columns, ddl, examples))
    }
}

#[cfg(test)]
#[path = "scanner_test.rs"]
mod tests;
