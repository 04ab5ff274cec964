//! Lossless translation between [`Manifest`] and its wire JSON.
//!
//! Export is sparse (see [`wire`]). Import accepts the codec's own output and
//! the snake_case internal form, and rejects structurally invalid documents
//! with [`CodecError::Validation`]; enum tokens are never coerced.

pub mod wire;

use crate::manifest::{
    Column, ColumnKind, EnumDefinition, EnumValue, Manifest, Metric, Model, ModelSource,
    Relationship, TableReference, TimeGrain, View,
};
use serde_json::error::Category;
use thiserror::Error;
use wire::{
    WireColumn, WireEnumDefinition, WireEnumValue, WireManifest, WireMetric, WireModel,
    WireRelationship, WireTableReference, WireTimeGrain, WireView,
};

/// JSON-Schema document describing the wire format
pub const MANIFEST_JSON_SCHEMA: &str = include_str!("manifest.schema.json");

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    /// V001: Document violates the wire schema
    #[error("[V001] Manifest validation failed: {0}")]
    Validation(String),

    /// V002: Document is not well-formed JSON
    #[error("[V002] Manifest is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
}

/// Result type alias for CodecError
pub type CodecResult<T> = Result<T, CodecError>;

fn invalid(message: impl Into<String>) -> CodecError {
    CodecError::Validation(message.into())
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Data => CodecError::Validation(err.to_string()),
            Category::Io | Category::Syntax | Category::Eof => CodecError::Json(err),
        }
    }
}

/// Encode a manifest to its wire shape
pub fn encode(manifest: &Manifest) -> WireManifest {
    WireManifest {
        catalog: manifest.catalog.clone(),
        schema: manifest.schema.clone(),
        data_source: manifest.data_source.clone(),
        models: manifest.models.iter().map(encode_model).collect(),
        relationships: manifest
            .relationships
            .iter()
            .map(encode_relationship)
            .collect(),
        metrics: manifest.metrics.iter().map(encode_metric).collect(),
        views: manifest
            .views
            .iter()
            .map(|v| WireView {
                name: v.name.clone(),
                statement: v.statement.clone(),
                properties: v.properties.clone(),
            })
            .collect(),
        enum_definitions: manifest
            .enum_definitions
            .iter()
            .map(encode_enum)
            .collect(),
    }
}

/// Encode a manifest to pretty-printed wire JSON
pub fn to_json(manifest: &Manifest) -> CodecResult<String> {
    serde_json::to_string_pretty(&encode(manifest)).map_err(CodecError::Json)
}

/// Decode wire JSON (or the internal snake_case form) into a manifest
pub fn from_json(json: &str) -> CodecResult<Manifest> {
    let wire: WireManifest = serde_json::from_str(json)?;
    decode(wire)
}

/// Decode an already-parsed JSON value
pub fn from_value(value: serde_json::Value) -> CodecResult<Manifest> {
    let wire: WireManifest = serde_json::from_value(value)?;
    decode(wire)
}

/// Validate and convert a wire document.
///
/// The result gets fresh timestamps and revision 1; only structural content
/// crosses the wire.
pub fn decode(wire: WireManifest) -> CodecResult<Manifest> {
    if wire.catalog.trim().is_empty() {
        return Err(invalid("'catalog' must not be empty"));
    }
    if wire.schema.trim().is_empty() {
        return Err(invalid("'schema' must not be empty"));
    }

    let mut manifest = Manifest::new(wire.catalog, wire.schema);
    manifest.data_source = wire.data_source;
    manifest.models = wire
        .models
        .into_iter()
        .map(decode_model)
        .collect::<CodecResult<_>>()?;
    manifest.relationships = wire
        .relationships
        .into_iter()
        .map(decode_relationship)
        .collect::<CodecResult<_>>()?;
    manifest.metrics = wire
        .metrics
        .into_iter()
        .map(decode_metric)
        .collect::<CodecResult<_>>()?;
    manifest.views = wire
        .views
        .into_iter()
        .map(|v| {
            require_name("view", &v.name)?;
            Ok(View {
                name: v.name,
                statement: v.statement,
                properties: v.properties,
            })
        })
        .collect::<CodecResult<_>>()?;
    manifest.enum_definitions = wire
        .enum_definitions
        .into_iter()
        .map(decode_enum)
        .collect::<CodecResult<_>>()?;

    manifest
        .check_invariants()
        .map_err(|e| invalid(e.to_string()))?;
    Ok(manifest)
}

fn require_name(kind: &str, name: &str) -> CodecResult<()> {
    if name.trim().is_empty() {
        return Err(invalid(format!("{kind} name must not be empty")));
    }
    Ok(())
}

fn encode_model(model: &Model) -> WireModel {
    let (ref_sql, table_reference) = match &model.source {
        Some(ModelSource::RefSql(sql)) => (Some(sql.clone()), None),
        Some(ModelSource::TableReference(t)) => (
            None,
            Some(WireTableReference {
                catalog: t.catalog.clone(),
                schema: t.schema.clone(),
                table: t.table.clone(),
            }),
        ),
        None => (None, None),
    };
    WireModel {
        name: model.name.clone(),
        ref_sql,
        table_reference,
        source: None,
        columns: model.columns.iter().map(encode_column).collect(),
        primary_key: model.primary_key.clone(),
        cached: model.cached,
        refresh_time: model.refresh_time.clone(),
        properties: model.properties.clone(),
    }
}

fn decode_model(wire: WireModel) -> CodecResult<Model> {
    require_name("model", &wire.name)?;

    let source = match (wire.ref_sql, wire.table_reference, wire.source) {
        (None, None, source) => source,
        (Some(sql), None, None) => Some(ModelSource::RefSql(sql)),
        (None, Some(t), None) => {
            if t.table.trim().is_empty() {
                return Err(invalid(format!(
                    "model '{}' has an empty tableReference.table",
                    wire.name
                )));
            }
            Some(ModelSource::TableReference(TableReference {
                catalog: t.catalog,
                schema: t.schema,
                table: t.table,
            }))
        }
        _ => {
            return Err(invalid(format!(
                "model '{}' must not define more than one of refSql / tableReference",
                wire.name
            )))
        }
    };

    let columns = wire
        .columns
        .into_iter()
        .map(|c| decode_column(&wire.name, c))
        .collect::<CodecResult<Vec<_>>>()?;

    Ok(Model {
        name: wire.name,
        source,
        columns,
        primary_key: wire.primary_key,
        cached: wire.cached,
        refresh_time: wire.refresh_time,
        properties: wire.properties,
    })
}

fn encode_column(column: &Column) -> WireColumn {
    WireColumn {
        name: column.name.clone(),
        data_type: column.data_type().to_string(),
        not_null: column.not_null,
        is_calculated: column.is_calculated(),
        expression: column.expression().map(String::from),
        relationship: column.relationship.clone(),
        is_hidden: column.is_hidden,
        properties: column.properties.clone(),
    }
}

fn decode_column(owner: &str, wire: WireColumn) -> CodecResult<Column> {
    require_name("column", &wire.name)?;
    let kind = match (wire.is_calculated, wire.expression) {
        (true, Some(expression)) => ColumnKind::Calculated {
            data_type: wire.data_type,
            expression,
        },
        (true, None) => {
            return Err(invalid(format!(
                "column '{owner}.{}' has isCalculated set but no expression",
                wire.name
            )))
        }
        (false, _) => ColumnKind::Plain {
            data_type: wire.data_type,
        },
    };
    Ok(Column {
        name: wire.name,
        kind,
        not_null: wire.not_null,
        relationship: wire.relationship,
        is_hidden: wire.is_hidden,
        properties: wire.properties,
    })
}

fn encode_relationship(rel: &Relationship) -> WireRelationship {
    WireRelationship {
        name: rel.name.clone(),
        models: rel.models.to_vec(),
        join_type: rel.join_type,
        condition: rel.condition.clone(),
        properties: rel.properties.clone(),
    }
}

fn decode_relationship(wire: WireRelationship) -> CodecResult<Relationship> {
    require_name("relationship", &wire.name)?;
    let models: [String; 2] = wire.models.try_into().map_err(|models: Vec<String>| {
        invalid(format!(
            "relationship '{}' must reference exactly two models, found {}",
            wire.name,
            models.len()
        ))
    })?;
    Ok(Relationship {
        name: wire.name,
        models,
        join_type: wire.join_type,
        condition: wire.condition,
        properties: wire.properties,
    })
}

fn encode_metric(metric: &Metric) -> WireMetric {
    WireMetric {
        name: metric.name.clone(),
        base_object: metric.base_object.clone(),
        dimension: metric.dimensions.iter().map(encode_column).collect(),
        measure: metric.measures.iter().map(encode_column).collect(),
        time_grain: metric
            .time_grains
            .iter()
            .map(|g| WireTimeGrain {
                name: g.name.clone(),
                ref_column: g.ref_column.clone(),
                date_parts: g.date_parts.clone(),
            })
            .collect(),
        cached: metric.cached,
        refresh_time: metric.refresh_time.clone(),
        properties: metric.properties.clone(),
    }
}

fn decode_metric(wire: WireMetric) -> CodecResult<Metric> {
    require_name("metric", &wire.name)?;
    let dimensions = wire
        .dimension
        .into_iter()
        .map(|c| decode_column(&wire.name, c))
        .collect::<CodecResult<_>>()?;
    let measures = wire
        .measure
        .into_iter()
        .map(|c| decode_column(&wire.name, c))
        .collect::<CodecResult<_>>()?;
    Ok(Metric {
        name: wire.name,
        base_object: wire.base_object,
        dimensions,
        measures,
        time_grains: wire
            .time_grain
            .into_iter()
            .map(|g| TimeGrain {
                name: g.name,
                ref_column: g.ref_column,
                date_parts: g.date_parts,
            })
            .collect(),
        cached: wire.cached,
        refresh_time: wire.refresh_time,
        properties: wire.properties,
    })
}

fn encode_enum(def: &EnumDefinition) -> WireEnumDefinition {
    WireEnumDefinition {
        name: def.name.clone(),
        values: def
            .values
            .iter()
            .map(|v| WireEnumValue {
                name: v.name.clone(),
                value: v.value.clone(),
                properties: v.properties.clone(),
            })
            .collect(),
        properties: def.properties.clone(),
    }
}

fn decode_enum(wire: WireEnumDefinition) -> CodecResult<EnumDefinition> {
    require_name("enum", &wire.name)?;
    let values = wire
        .values
        .into_iter()
        .map(|v| {
            require_name(&format!("enum '{}' value", wire.name), &v.name)?;
            Ok(EnumValue {
                name: v.name,
                value: v.value,
                properties: v.properties,
            })
        })
        .collect::<CodecResult<_>>()?;
    Ok(EnumDefinition {
        name: wire.name,
        values,
        properties: wire.properties,
    })
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod tests;
