//! Table descriptions produced by the schema scan pipeline.
//!
//! A [`TableDescription`] is the stored record for one live table, keyed by
//! [`TableKey`]. It is created at [`SyncStatus::NotScanned`] when a refresh
//! discovers the table, filled in by a scan, and never deleted: tables that
//! vanish from the live schema are moved to [`SyncStatus::Deprecated`].

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Maximum number of example rows kept per table
pub const MAX_EXAMPLE_ROWS: usize = 3;

/// One sampled row, every value coerced to its string form
pub type ExampleRow = BTreeMap<String, String>;

/// Identity of a stored table description: `(connection, schema, table)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableKey {
    /// Connection the table was discovered through
    pub connection_id: String,
    /// Database schema name
    pub schema: String,
    /// Table (or view) name
    pub table_name: String,
}

impl TableKey {
    /// Create a new key
    pub fn new(
        connection_id: impl Into<String>,
        schema: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            schema: schema.into(),
            table_name: table_name.into(),
        }
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.connection_id, self.schema, self.table_name)
    }
}

/// Lifecycle state of a stored table description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// Discovered by refresh, never scanned
    #[default]
    NotScanned,
    /// Scan in flight
    Synchronizing,
    /// Last scan succeeded
    Scanned,
    /// Last scan failed; retry by scanning again
    Failed,
    /// Table no longer exists in the live schema
    Deprecated,
}

impl SyncStatus {
    /// Token used in storage and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::NotScanned => "NOT_SCANNED",
            SyncStatus::Synchronizing => "SYNCHRONIZING",
            SyncStatus::Scanned => "SCANNED",
            SyncStatus::Failed => "FAILED",
            SyncStatus::Deprecated => "DEPRECATED",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Re-entering the current state is always allowed so refresh and scan
    /// stay idempotent. Any state may become `Deprecated`, and any state
    /// except an in-flight scan may start a new scan.
    pub fn can_transition_to(&self, next: SyncStatus) -> bool {
        if *self == next {
            return true;
        }
        match next {
            SyncStatus::Deprecated => true,
            SyncStatus::Synchronizing => *self != SyncStatus::Synchronizing,
            SyncStatus::Scanned | SyncStatus::Failed => *self == SyncStatus::Synchronizing,
            SyncStatus::NotScanned => false,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_SCANNED" => Ok(SyncStatus::NotScanned),
            "SYNCHRONIZING" => Ok(SyncStatus::Synchronizing),
            "SCANNED" => Ok(SyncStatus::Scanned),
            "FAILED" => Ok(SyncStatus::Failed),
            "DEPRECATED" => Ok(SyncStatus::Deprecated),
            other => Err(CoreError::UnknownSyncStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// Pointer from a column to the column it references in another table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced column name
    pub field_name: String,
    /// Referenced table name
    pub reference_table: String,
}

/// Cardinality classification of one column
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnProfile {
    /// Whether the distinct-value estimate fell in the low-cardinality band
    pub low_cardinality: bool,
    /// Most common values, present only for low-cardinality columns
    pub categories: Option<Vec<String>>,
}

impl ColumnProfile {
    /// A high-cardinality profile (no categories)
    pub fn high() -> Self {
        Self::default()
    }

    /// A low-cardinality profile carrying the engine's common values verbatim
    pub fn low(categories: Vec<String>) -> Self {
        Self {
            low_cardinality: true,
            categories: Some(categories),
        }
    }
}

/// Scanned description of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescription {
    /// Column name
    pub name: String,

    /// Engine-specific type string, carried verbatim
    pub data_type: String,

    /// Part of the table's primary key
    #[serde(default)]
    pub is_primary_key: bool,

    /// Distinct values are few enough to enumerate
    #[serde(default)]
    pub low_cardinality: bool,

    /// Enumerated values; `Some` only when `low_cardinality` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,

    /// Declared foreign key, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,

    /// Free-text description (user supplied; scans leave it empty)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ColumnDescription {
    /// Create an unprofiled column description
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_primary_key: false,
            low_cardinality: false,
            categories: None,
            foreign_key: None,
            description: None,
        }
    }

    /// Mark the column as (part of) the primary key
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Attach a foreign-key pointer
    pub fn references(mut self, table: impl Into<String>, field: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKeyRef {
            field_name: field.into(),
            reference_table: table.into(),
        });
        self
    }

    /// Apply a cardinality profile
    pub fn with_profile(mut self, profile: ColumnProfile) -> Self {
        self.low_cardinality = profile.low_cardinality;
        self.categories = if profile.low_cardinality {
            profile.categories
        } else {
            None
        };
        self
    }
}

/// Stored metadata for one live table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescription {
    /// Store-assigned id, `None` until first persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Identity key
    #[serde(flatten)]
    pub key: TableKey,

    /// Lifecycle state
    #[serde(default)]
    pub sync_status: SyncStatus,

    /// Surviving columns from the last successful scan
    #[serde(default)]
    pub columns: Vec<ColumnDescription>,

    /// Reconstructed `CREATE TABLE` statement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddl: Option<String>,

    /// Up to [`MAX_EXAMPLE_ROWS`] string-coerced sample rows
    #[serde(default)]
    pub examples: Vec<ExampleRow>,

    /// When the last scan attempt finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,

    /// Error text from the last failed scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Free-text table description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TableDescription {
    /// A freshly discovered, unscanned table
    pub fn discovered(key: TableKey) -> Self {
        Self {
            id: None,
            key,
            sync_status: SyncStatus::NotScanned,
            columns: Vec::new(),
            ddl: None,
            examples: Vec::new(),
            last_sync: None,
            error_message: None,
            description: None,
        }
    }

    /// Table name shortcut
    pub fn table_name(&self) -> &str {
        &self.key.table_name
    }

    /// Record a successful scan
    pub fn mark_scanned(
        &mut self,
        columns: Vec<ColumnDescription>,
        ddl: String,
        mut examples: Vec<ExampleRow>,
    ) {
        examples.truncate(MAX_EXAMPLE_ROWS);
        self.columns = columns;
        self.ddl = Some(ddl);
        self.examples = examples;
        self.sync_status = SyncStatus::Scanned;
        self.last_sync = Some(Utc::now());
        self.error_message = None;
    }

    /// Record a failed scan, keeping whatever the previous scan captured
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.sync_status = SyncStatus::Failed;
        self.last_sync = Some(Utc::now());
        self.error_message = Some(message.into());
    }

    /// Columns of the primary key, in declaration order
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &ColumnDescription> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }
}

#[cfg(test)]
#[path = "description_test.rs"]
mod tests;
