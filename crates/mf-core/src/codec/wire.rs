//! Interchange (wire) shape of a manifest.
//!
//! Field names are camelCase. Every optional field is omitted when empty,
//! booleans are emitted only when `true`. Each field also accepts the
//! snake_case spelling written by the persistence layer.

use crate::manifest::{DatePart, JoinType, ModelSource, Properties};
use crate::serde_helpers::is_false;
use serde::{Deserialize, Serialize};

/// Top-level wire document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireManifest {
    pub catalog: String,

    pub schema: String,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "data_source")]
    pub data_source: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<WireModel>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<WireRelationship>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metrics: Vec<WireMetric>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<WireView>,

    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        alias = "enum_definitions"
    )]
    pub enum_definitions: Vec<WireEnumDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTableReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireModel {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "ref_sql")]
    pub ref_sql: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "table_reference"
    )]
    pub table_reference: Option<WireTableReference>,

    /// Internal-form source (`{"table_reference": ..}` / `{"ref_sql": ..}`);
    /// read on import, never written.
    #[serde(default, skip_serializing)]
    pub source: Option<ModelSource>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<WireColumn>,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "primary_key")]
    pub primary_key: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub cached: bool,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "refresh_time")]
    pub refresh_time: Option<String>,

    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireColumn {
    pub name: String,

    #[serde(rename = "type")]
    pub data_type: String,

    #[serde(default, skip_serializing_if = "is_false", alias = "not_null")]
    pub not_null: bool,

    #[serde(default, skip_serializing_if = "is_false", alias = "is_calculated")]
    pub is_calculated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,

    #[serde(default, skip_serializing_if = "is_false", alias = "is_hidden")]
    pub is_hidden: bool,

    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRelationship {
    pub name: String,

    /// Exactly two entries; checked on import
    pub models: Vec<String>,

    #[serde(alias = "join_type")]
    pub join_type: JoinType,

    pub condition: String,

    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTimeGrain {
    pub name: String,

    #[serde(alias = "ref_column")]
    pub ref_column: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "date_parts")]
    pub date_parts: Vec<DatePart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMetric {
    pub name: String,

    #[serde(alias = "base_object")]
    pub base_object: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "dimensions")]
    pub dimension: Vec<WireColumn>,

    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "measures")]
    pub measure: Vec<WireColumn>,

    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "time_grains")]
    pub time_grain: Vec<WireTimeGrain>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub cached: bool,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "refresh_time")]
    pub refresh_time: Option<String>,

    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireView {
    pub name: String,

    pub statement: String,

    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEnumValue {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEnumDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<WireEnumValue>,

    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}
