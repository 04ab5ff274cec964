//! Semantic-layer manifest types.
//!
//! A [`Manifest`] is a self-contained value: once built it has no link back
//! to the table descriptions that produced it. Its serde form (snake_case
//! field names) is the internal persistence shape; the interchange shape
//! lives in [`crate::codec`].

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Free-form string property bag attached to most manifest entities
pub type Properties = BTreeMap<String, String>;

/// Property key holding free-text descriptions
pub const DESCRIPTION_PROPERTY: &str = "description";

/// Primary key name assumed when a model declares none
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// The semantic-layer manifest for one database connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Catalog (database) name
    pub catalog: String,

    /// Schema name
    pub schema: String,

    /// Data-source tag (e.g. `duckdb`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,

    /// Models, one per table or view
    #[serde(default)]
    pub models: Vec<Model>,

    /// Binary join definitions between models
    #[serde(default)]
    pub relationships: Vec<Relationship>,

    /// Business metrics
    #[serde(default)]
    pub metrics: Vec<Metric>,

    /// Named SQL views
    #[serde(default)]
    pub views: Vec<View>,

    /// Enumerations referenced by columns
    #[serde(default)]
    pub enum_definitions: Vec<EnumDefinition>,

    /// Revision counter, bumped by every mutation
    #[serde(default = "default_version")]
    pub version: u32,

    /// When the manifest was first built
    pub created_at: DateTime<Utc>,

    /// When the manifest was last mutated
    pub updated_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl Manifest {
    /// Create an empty manifest
    pub fn new(catalog: impl Into<String>, schema: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            data_source: None,
            models: Vec::new(),
            relationships: Vec::new(),
            metrics: Vec::new(),
            views: Vec::new(),
            enum_definitions: Vec::new(),
            version: default_version(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a model by name
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Look up a relationship by name
    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// All model names, in manifest order
    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    /// Record a mutation: bump the revision and the update timestamp
    pub(crate) fn touch(&mut self) {
        self.version = self.version.saturating_add(1);
        self.updated_at = Utc::now();
    }

    /// Copy with revision and timestamps zeroed, for structural comparison
    pub fn without_bookkeeping(&self) -> Manifest {
        let epoch = DateTime::<Utc>::default();
        Manifest {
            version: 0,
            created_at: epoch,
            updated_at: epoch,
            ..self.clone()
        }
    }

    /// Verify name uniqueness and that every relationship points at
    /// existing models.
    pub fn check_invariants(&self) -> CoreResult<()> {
        let mut model_names = HashSet::new();
        for model in &self.models {
            if !model_names.insert(model.name.as_str()) {
                return Err(CoreError::ManifestInvariant {
                    message: format!("duplicate model name '{}'", model.name),
                });
            }
        }

        let mut relationship_names = HashSet::new();
        for rel in &self.relationships {
            if !relationship_names.insert(rel.name.as_str()) {
                return Err(CoreError::ManifestInvariant {
                    message: format!("duplicate relationship name '{}'", rel.name),
                });
            }
            for model in &rel.models {
                if !model_names.contains(model.as_str()) {
                    return Err(CoreError::ManifestInvariant {
                        message: format!(
                            "relationship '{}' references unknown model '{}'",
                            rel.name, model
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Where a model's rows come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    /// A physical table
    TableReference(TableReference),
    /// A defining SQL query
    RefSql(String),
}

/// Fully or partially qualified physical table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReference {
    /// Catalog name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    /// Schema name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Table name
    pub table: String,
}

/// Manifest-level representation of one table or view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Unique model name
    pub name: String,

    /// Table reference or defining query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ModelSource>,

    /// Columns
    #[serde(default)]
    pub columns: Vec<Column>,

    /// Declared primary key column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,

    /// Whether results may be cached
    #[serde(default)]
    pub cached: bool,

    /// Cache refresh interval (opaque, e.g. `30m`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_time: Option<String>,

    /// Free-form properties
    #[serde(default)]
    pub properties: Properties,
}

impl Model {
    /// Create a model with no source and no columns
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            columns: Vec::new(),
            primary_key: None,
            cached: false,
            refresh_time: None,
            properties: Properties::new(),
        }
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary key, or [`DEFAULT_PRIMARY_KEY`] if none is declared
    pub fn primary_key_or_default(&self) -> &str {
        self.primary_key.as_deref().unwrap_or(DEFAULT_PRIMARY_KEY)
    }

    /// Description stored in the property bag
    pub fn description(&self) -> Option<&str> {
        self.properties.get(DESCRIPTION_PROPERTY).map(String::as_str)
    }
}

/// Whether a column maps to storage or is computed from an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// A physical column
    Plain {
        /// Engine-specific type string
        data_type: String,
    },
    /// A computed column; the expression is always present
    Calculated {
        /// Engine-specific type string
        data_type: String,
        /// SQL expression producing the value
        expression: String,
    },
}

/// Manifest-level column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ColumnRecord", try_from = "ColumnRecord")]
pub struct Column {
    /// Column name
    pub name: String,
    /// Plain or calculated
    pub kind: ColumnKind,
    /// Values are never NULL
    pub not_null: bool,
    /// Relationship this column navigates, if any
    pub relationship: Option<String>,
    /// Hidden from consumers
    pub is_hidden: bool,
    /// Free-form properties
    pub properties: Properties,
}

impl Column {
    /// A plain column
    pub fn plain(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Plain {
                data_type: data_type.into(),
            },
            not_null: false,
            relationship: None,
            is_hidden: false,
            properties: Properties::new(),
        }
    }

    /// A calculated column
    pub fn calculated(
        name: impl Into<String>,
        data_type: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            kind: ColumnKind::Calculated {
                data_type: data_type.into(),
                expression: expression.into(),
            },
            ..Self::plain(name, "")
        }
    }

    /// Type string, whichever kind
    pub fn data_type(&self) -> &str {
        match &self.kind {
            ColumnKind::Plain { data_type } | ColumnKind::Calculated { data_type, .. } => {
                data_type
            }
        }
    }

    /// Expression, only for calculated columns
    pub fn expression(&self) -> Option<&str> {
        match &self.kind {
            ColumnKind::Plain { .. } => None,
            ColumnKind::Calculated { expression, .. } => Some(expression),
        }
    }

    /// Whether the column is calculated
    pub fn is_calculated(&self) -> bool {
        matches!(self.kind, ColumnKind::Calculated { .. })
    }
}

/// Flat serde shape of [`Column`] in the internal form
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnRecord {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
    #[serde(default)]
    not_null: bool,
    #[serde(default)]
    is_calculated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    relationship: Option<String>,
    #[serde(default)]
    is_hidden: bool,
    #[serde(default)]
    properties: Properties,
}

impl From<Column> for ColumnRecord {
    fn from(col: Column) -> Self {
        let (data_type, is_calculated, expression) = match col.kind {
            ColumnKind::Plain { data_type } => (data_type, false, None),
            ColumnKind::Calculated {
                data_type,
                expression,
            } => (data_type, true, Some(expression)),
        };
        ColumnRecord {
            name: col.name,
            data_type,
            not_null: col.not_null,
            is_calculated,
            expression,
            relationship: col.relationship,
            is_hidden: col.is_hidden,
            properties: col.properties,
        }
    }
}

impl TryFrom<ColumnRecord> for Column {
    type Error = String;

    fn try_from(rec: ColumnRecord) -> Result<Self, Self::Error> {
        let kind = match (rec.is_calculated, rec.expression) {
            (true, Some(expression)) => ColumnKind::Calculated {
                data_type: rec.data_type,
                expression,
            },
            (true, None) => {
                return Err(format!(
                    "column '{}' is calculated but has no expression",
                    rec.name
                ))
            }
            (false, _) => ColumnKind::Plain {
                data_type: rec.data_type,
            },
        };
        Ok(Column {
            name: rec.name,
            kind,
            not_null: rec.not_null,
            relationship: rec.relationship,
            is_hidden: rec.is_hidden,
            properties: rec.properties,
        })
    }
}

/// Join cardinality of a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinType {
    /// 1:1
    OneToOne,
    /// 1:N
    OneToMany,
    /// N:1
    ManyToOne,
    /// N:M
    ManyToMany,
}

impl JoinType {
    /// Wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::OneToOne => "ONE_TO_ONE",
            JoinType::OneToMany => "ONE_TO_MANY",
            JoinType::ManyToOne => "MANY_TO_ONE",
            JoinType::ManyToMany => "MANY_TO_MANY",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A binary join definition between two models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique relationship name
    pub name: String,
    /// The two joined model names, `[from, to]`
    pub models: [String; 2],
    /// Join cardinality
    pub join_type: JoinType,
    /// Join condition in `A.col = B.col` form
    pub condition: String,
    /// Free-form properties
    #[serde(default)]
    pub properties: Properties,
}

impl Relationship {
    /// Create a relationship
    pub fn new(
        name: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        join_type: JoinType,
        condition: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            models: [from.into(), to.into()],
            join_type,
            condition: condition.into(),
            properties: Properties::new(),
        }
    }

    /// Whether either side of the relationship is `model`
    pub fn references(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }
}

/// Calendar unit a time grain can roll up to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatePart {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

/// Time dimension of a metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeGrain {
    /// Grain name
    pub name: String,
    /// Timestamp column on the base object
    pub ref_column: String,
    /// Supported roll-up units
    #[serde(default)]
    pub date_parts: Vec<DatePart>,
}

/// Business metric defined over a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    /// Unique metric name
    pub name: String,
    /// Model (or metric) the metric is computed from
    pub base_object: String,
    /// Grouping columns
    #[serde(default)]
    pub dimensions: Vec<Column>,
    /// Aggregated columns
    #[serde(default)]
    pub measures: Vec<Column>,
    /// Time dimensions
    #[serde(default)]
    pub time_grains: Vec<TimeGrain>,
    /// Whether results may be cached
    #[serde(default)]
    pub cached: bool,
    /// Cache refresh interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_time: Option<String>,
    /// Free-form properties
    #[serde(default)]
    pub properties: Properties,
}

/// Named SQL view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    /// Unique view name
    pub name: String,
    /// Defining statement
    pub statement: String,
    /// Free-form properties
    #[serde(default)]
    pub properties: Properties,
}

/// One member of an enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Symbolic name
    pub name: String,
    /// Stored value, when it differs from the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Free-form properties
    #[serde(default)]
    pub properties: Properties,
}

/// Named enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDefinition {
    /// Enumeration name
    pub name: String,
    /// Members
    #[serde(default)]
    pub values: Vec<EnumValue>,
    /// Free-form properties
    #[serde(default)]
    pub properties: Properties,
}

#[cfg(test)]
#[path = "manifest_test.rs"]
mod tests;
