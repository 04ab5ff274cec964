//! In-process engine double for scanner tests.

use async_trait::async_trait;
use mf_db::{
    ColumnStatistics, ColumnType, DbError, DbResult, Engine, ReflectedColumn, RelationInfo,
    RelationKind, SampleRow, SchemaMetadata, TableMetadata,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Column fixture: name, type, sample value and statistics
#[derive(Debug, Clone)]
pub(crate) struct FakeColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub sample: Option<String>,
    pub stats: ColumnStatistics,
}

impl FakeColumn {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            column_type: ColumnType::Known(data_type.to_string()),
            sample: Some("1".to_string()),
            stats: ColumnStatistics {
                distinct_estimate: Some(1000),
                most_common_values: Vec::new(),
            },
        }
    }

    pub fn unsupported(name: &str) -> Self {
        Self {
            column_type: ColumnType::Unsupported("INVALID".to_string()),
            ..Self::new(name, "INVALID")
        }
    }

    pub fn sample(mut self, value: Option<&str>) -> Self {
        self.sample = value.map(String::from);
        self
    }

    pub fn categories(mut self, values: &[&str]) -> Self {
        self.stats = ColumnStatistics {
            distinct_estimate: Some(values.len() as i64),
            most_common_values: values.iter().map(|v| v.to_string()).collect(),
        };
        self
    }
}

/// Scripted [`Engine`] with call counters
#[derive(Default)]
pub(crate) struct FakeEngine {
    tables: Mutex<BTreeMap<String, (TableMetadata, Vec<FakeColumn>)>>,
    views: Vec<String>,
    failing: HashMap<String, fn(&str) -> DbError>,
    pub reflect_calls: AtomicUsize,
    pub statistics_calls: AtomicUsize,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(self, name: &str, columns: Vec<FakeColumn>) -> Self {
        self.table_with(name, columns, |_| {})
    }

    pub fn table_with(
        self,
        name: &str,
        columns: Vec<FakeColumn>,
        edit: impl FnOnce(&mut TableMetadata),
    ) -> Self {
        let mut meta = TableMetadata::new("main", name);
        meta.columns = columns
            .iter()
            .map(|c| ReflectedColumn {
                name: c.name.clone(),
                column_type: c.column_type.clone(),
                nullable: true,
            })
            .collect();
        edit(&mut meta);
        if let Ok(mut tables) = self.tables.lock() {
            tables.insert(name.to_string(), (meta, columns));
        }
        self
    }

    pub fn view(mut self, name: &str) -> Self {
        self.views.push(name.to_string());
        self
    }

    /// Every column query against `table` fails with `error`
    pub fn failing(mut self, table: &str, error: fn(&str) -> DbError) -> Self {
        self.failing.insert(table.to_string(), error);
        self
    }

    pub fn drop_table(&self, name: &str) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.remove(name);
        }
    }

    fn column(&self, table: &TableMetadata, column: &str) -> DbResult<FakeColumn> {
        if let Some(error) = self.failing.get(&table.name) {
            return Err(error(&table.name));
        }
        let tables = self
            .tables
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        tables
            .get(&table.name)
            .and_then(|(_, cols)| cols.iter().find(|c| c.name == column))
            .cloned()
            .ok_or_else(|| DbError::TableNotFound(format!("{}.{}", table.name, column)))
    }
}

#[async_trait]
impl Engine for FakeEngine {
    fn db_type(&self) -> &'static str {
        "fake"
    }

    async fn list_relations(&self, _schema: &str) -> DbResult<Vec<RelationInfo>> {
        let tables = self
            .tables
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        let mut relations: Vec<RelationInfo> = tables
            .keys()
            .map(|name| RelationInfo {
                name: name.clone(),
                kind: RelationKind::Table,
            })
            .chain(self.views.iter().map(|name| RelationInfo {
                name: name.clone(),
                kind: RelationKind::View,
            }))
            .collect();
        relations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(relations)
    }

    async fn reflect_schema(&self, schema: &str) -> DbResult<SchemaMetadata> {
        self.reflect_calls.fetch_add(1, Ordering::SeqCst);
        let tables = self
            .tables
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        Ok(SchemaMetadata {
            schema: schema.to_string(),
            tables: tables
                .iter()
                .map(|(name, (meta, _))| (name.clone(), meta.clone()))
                .collect(),
        })
    }

    async fn sample_value(&self, table: &TableMetadata, column: &str) -> DbResult<Option<String>> {
        Ok(self.column(table, column)?.sample)
    }

    async fn column_statistics(
        &self,
        table: &TableMetadata,
        column: &str,
    ) -> DbResult<ColumnStatistics> {
        self.statistics_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.column(table, column)?.stats)
    }

    async fn sample_rows(
        &self,
        table: &TableMetadata,
        columns: &[String],
        limit: usize,
    ) -> DbResult<Vec<SampleRow>> {
        let mut rows = Vec::new();
        for _ in 0..limit.min(5) {
            let mut row = SampleRow::new();
            for column in columns {
                let value = self
                    .column(table, column)?
                    .sample
                    .unwrap_or_else(|| "null".to_string());
                row.insert(column.clone(), value);
            }
            rows.push(row);
        }
        Ok(rows)
    }

    fn compile_create_table(&self, table: &TableMetadata) -> String {
        mf_db::duckdb::render_create_table(table)
    }
}
