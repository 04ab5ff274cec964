//! Engine trait and reflected metadata types

use crate::error::DbResult;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// One sampled row: column name to the value's string form
pub type SampleRow = BTreeMap<String, String>;

/// Kind of a listed relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    Table,
    View,
}

/// A relation present in the live schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationInfo {
    pub name: String,
    pub kind: RelationKind,
}

/// Native column type as reflected from the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// A type the manifest can carry, by its engine spelling
    Known(String),
    /// A type with no usable representation (e.g. DuckDB `INVALID`)
    Unsupported(String),
}

impl ColumnType {
    /// Engine spelling of the type
    pub fn name(&self) -> &str {
        match self {
            ColumnType::Known(name) | ColumnType::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, ColumnType::Known(_))
    }
}

/// Reflected column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

/// Reflected foreign key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyMetadata {
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

impl ForeignKeyMetadata {
    /// Column pairs `(local, referenced)`
    pub fn column_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.referenced_columns.iter().map(String::as_str))
    }
}

/// Reflected table or view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ReflectedColumn>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyMetadata>,
}

impl TableMetadata {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key.iter().any(|c| c == column)
    }

    /// Foreign key covering `column`, with the referenced column name
    pub fn foreign_key_for(&self, column: &str) -> Option<(&str, &str)> {
        self.foreign_keys.iter().find_map(|fk| {
            fk.column_pairs()
                .find(|(local, _)| *local == column)
                .map(|(_, referenced)| (fk.referenced_table.as_str(), referenced))
        })
    }
}

/// Reflected metadata of one schema, keyed by table name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaMetadata {
    pub schema: String,
    pub tables: BTreeMap<String, TableMetadata>,
}

impl SchemaMetadata {
    pub fn table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.get(name)
    }
}

/// Column statistics used by profiling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnStatistics {
    /// Estimated number of distinct values
    pub distinct_estimate: Option<i64>,
    /// Most common non-null values, most frequent first
    pub most_common_values: Vec<String>,
}

/// Engine connection used by the scanner.
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Engine type identifier for logging
    fn db_type(&self) -> &'static str;

    /// Tables and views of a schema, ordered by name
    async fn list_relations(&self, schema: &str) -> DbResult<Vec<RelationInfo>>;

    /// Columns and key constraints of every relation in a schema
    async fn reflect_schema(&self, schema: &str) -> DbResult<SchemaMetadata>;

    /// One non-null value of a column as a string, if the column has any
    async fn sample_value(&self, table: &TableMetadata, column: &str) -> DbResult<Option<String>>;

    /// Distinct estimate and most common values of a column
    async fn column_statistics(
        &self,
        table: &TableMetadata,
        column: &str,
    ) -> DbResult<ColumnStatistics>;

    /// Up to `limit` rows of the given columns, every value as a string
    /// (`NULL` as `"null"`)
    async fn sample_rows(
        &self,
        table: &TableMetadata,
        columns: &[String],
        limit: usize,
    ) -> DbResult<Vec<SampleRow>>;

    /// `CREATE TABLE` statement for the reflected table, without foreign keys
    fn compile_create_table(&self, table: &TableMetadata) -> String;
}
