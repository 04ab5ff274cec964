//! DuckDB engine backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{
    ColumnStatistics, ColumnType, Engine, ForeignKeyMetadata, ReflectedColumn, RelationInfo,
    RelationKind, SampleRow, SchemaMetadata, TableMetadata,
};
use async_trait::async_trait;
use duckdb::Connection;
use mf_core::sql_utils::{quote_ident, quote_table};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Upper bound on most-common values returned by [`Engine::column_statistics`]
pub const MOST_COMMON_VALUES_LIMIT: usize = 60;

/// Reflected type names that carry no usable type
const UNSUPPORTED_TYPES: &[&str] = &["INVALID", "UNKNOWN", "ANY", "NULL"];

/// DuckDB engine backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute batch SQL synchronously (fixtures and setup)
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    fn list_relations_sync(&self, schema: &str) -> DbResult<Vec<RelationInfo>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT table_name, table_type FROM information_schema.tables \
             WHERE table_schema = ? AND table_catalog = current_database() \
             ORDER BY table_name",
        )?;
        let rows = stmt.query_map(duckdb::params![schema], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut relations = Vec::new();
        for row in rows {
            let (name, table_type) = row?;
            let kind = if table_type == "VIEW" {
                RelationKind::View
            } else {
                RelationKind::Table
            };
            relations.push(RelationInfo { name, kind });
        }
        Ok(relations)
    }

    fn reflect_schema_sync(&self, schema: &str) -> DbResult<SchemaMetadata> {
        let conn = self.lock()?;
        let mut metadata = SchemaMetadata {
            schema: schema.to_string(),
            tables: Default::default(),
        };

        let mut stmt = conn.prepare(
            "SELECT table_name, column_name, data_type, is_nullable \
             FROM duckdb_columns() \
             WHERE schema_name = ? AND database_name = current_database() \
             ORDER BY table_name, column_index",
        )?;
        let rows = stmt.query_map(duckdb::params![schema], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, bool>(3)?,
            ))
        })?;
        for row in rows {
            let (table, name, data_type, nullable) = row?;
            metadata
                .tables
                .entry(table.clone())
                .or_insert_with(|| TableMetadata::new(schema, table))
                .columns
                .push(ReflectedColumn {
                    name,
                    column_type: classify_type(data_type.as_deref().unwrap_or_default()),
                    nullable,
                });
        }

        let mut stmt = conn.prepare(
            "SELECT table_name, constraint_type, \
                    array_to_string(constraint_column_names, ','), \
                    referenced_table, \
                    array_to_string(referenced_column_names, ',') \
             FROM duckdb_constraints() \
             WHERE schema_name = ? AND database_name = current_database() \
               AND constraint_type IN ('PRIMARY KEY', 'FOREIGN KEY') \
             ORDER BY table_name, constraint_index",
        )?;
        let rows = stmt.query_map(duckdb::params![schema], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;
        for row in rows {
            let (table, constraint_type, columns, referenced_table, referenced_columns) = row?;
            let Some(entry) = metadata.tables.get_mut(&table) else {
                continue;
            };
            let columns = split_names(columns.as_deref());
            match (constraint_type.as_str(), referenced_table) {
                ("PRIMARY KEY", _) => entry.primary_key = columns,
                ("FOREIGN KEY", Some(referenced_table)) => {
                    entry.foreign_keys.push(ForeignKeyMetadata {
                        columns,
                        referenced_table,
                        referenced_columns: split_names(referenced_columns.as_deref()),
                    })
                }
                _ => {}
            }
        }

        Ok(metadata)
    }

    fn sample_value_sync(&self, table: &TableMetadata, column: &str) -> DbResult<Option<String>> {
        let col = quote_ident(column);
        let sql = format!(
            "SELECT CAST({col} AS VARCHAR) FROM {} WHERE {col} IS NOT NULL LIMIT 1",
            quote_table(&table.schema, &table.name)
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(row.get::<_, Option<String>>(0)?),
            None => Ok(None),
        }
    }

    fn column_statistics_sync(
        &self,
        table: &TableMetadata,
        column: &str,
    ) -> DbResult<ColumnStatistics> {
        let col = quote_ident(column);
        let relation = quote_table(&table.schema, &table.name);
        let conn = self.lock()?;

        let distinct_estimate: Option<i64> = conn.query_row(
            &format!("SELECT CAST(approx_count_distinct({col}) AS BIGINT) FROM {relation}"),
            [],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT CAST({col} AS VARCHAR) FROM {relation} \
             WHERE {col} IS NOT NULL \
             GROUP BY {col} \
             ORDER BY count(*) DESC, 1 \
             LIMIT {MOST_COMMON_VALUES_LIMIT}"
        ))?;
        let most_common_values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ColumnStatistics {
            distinct_estimate,
            most_common_values,
        })
    }

    fn sample_rows_sync(
        &self,
        table: &TableMetadata,
        columns: &[String],
        limit: usize,
    ) -> DbResult<Vec<SampleRow>> {
        if columns.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let select_list = columns
            .iter()
            .map(|c| format!("CAST({} AS VARCHAR)", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {select_list} FROM {} LIMIT {limit}",
            quote_table(&table.schema, &table.name)
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut samples = Vec::new();
        while let Some(row) = rows.next()? {
            let mut sample = SampleRow::new();
            for (i, name) in columns.iter().enumerate() {
                let value: Option<String> = row.get(i)?;
                sample.insert(name.clone(), value.unwrap_or_else(|| "null".to_string()));
            }
            samples.push(sample);
        }
        Ok(samples)
    }
}

fn classify_type(data_type: &str) -> ColumnType {
    let trimmed = data_type.trim();
    if trimmed.is_empty() || UNSUPPORTED_TYPES.contains(&trimmed.to_uppercase().as_str()) {
        ColumnType::Unsupported(trimmed.to_string())
    } else {
        ColumnType::Known(trimmed.to_string())
    }
}

fn split_names(joined: Option<&str>) -> Vec<String> {
    joined
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Render `CREATE TABLE` for reflected metadata, one column per line.
///
/// Unsupported columns are left out.
pub fn render_create_table(table: &TableMetadata) -> String {
    let mut lines: Vec<String> = table
        .columns
        .iter()
        .filter(|c| c.column_type.is_supported())
        .map(|c| {
            let mut line = format!("{} {}", quote_ident(&c.name), c.column_type.name());
            if !c.nullable {
                line.push_str(" NOT NULL");
            }
            line
        })
        .collect();
    if !table.primary_key.is_empty() {
        let pk = table
            .primary_key
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("PRIMARY KEY ({pk})"));
    }
    format!(
        "CREATE TABLE {} (\n\t{}\n)",
        quote_table(&table.schema, &table.name),
        lines.join(",\n\t")
    )
}

#[async_trait]
impl Engine for DuckDbBackend {
    fn db_type(&self) -> &'static str {
        "duckdb"
    }

    async fn list_relations(&self, schema: &str) -> DbResult<Vec<RelationInfo>> {
        self.list_relations_sync(schema)
    }

    async fn reflect_schema(&self, schema: &str) -> DbResult<SchemaMetadata> {
        let metadata = self.reflect_schema_sync(schema)?;
        log::debug!(
            "Reflected {} relations in schema '{}'",
            metadata.tables.len(),
            schema
        );
        Ok(metadata)
    }

    async fn sample_value(&self, table: &TableMetadata, column: &str) -> DbResult<Option<String>> {
        self.sample_value_sync(table, column)
    }

    async fn column_statistics(
        &self,
        table: &TableMetadata,
        column: &str,
    ) -> DbResult<ColumnStatistics> {
        self.column_statistics_sync(table, column)
    }

    async fn sample_rows(
        &self,
        table: &TableMetadata,
        columns: &[String],
        limit: usize,
    ) -> DbResult<Vec<SampleRow>> {
        self.sample_rows_sync(table, columns, limit)
    }

    fn compile_create_table(&self, table: &TableMetadata) -> String {
        render_create_table(table)
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
