//! Manifest construction from scanned table descriptions, plus the pure
//! mutation functions used to edit a manifest afterwards.

use crate::description::{SyncStatus, TableDescription};
use crate::inference::{apply_inferred, unique_relationship_name};
use crate::manifest::{
    Column, JoinType, Manifest, Model, ModelSource, Relationship, TableReference,
    DESCRIPTION_PROPERTY,
};
use std::collections::HashSet;

/// Property key holding a low-cardinality column's enumerated values
pub const CATEGORIES_PROPERTY: &str = "categories";

/// Builds a [`Manifest`] from the table descriptions of one connection.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    catalog: String,
    schema: String,
    data_source: Option<String>,
    infer_relationships: bool,
}

impl ManifestBuilder {
    /// Start a builder for `catalog.schema`
    pub fn new(catalog: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            data_source: None,
            infer_relationships: false,
        }
    }

    /// Tag the manifest with a data source
    pub fn data_source(mut self, data_source: impl Into<String>) -> Self {
        self.data_source = Some(data_source.into());
        self
    }

    /// Run naming-convention inference after the foreign-key pass
    pub fn infer_relationships(mut self, enabled: bool) -> Self {
        self.infer_relationships = enabled;
        self
    }

    /// Build the manifest.
    ///
    /// Deprecated descriptions are skipped. Every other description becomes
    /// one model, in input order.
    pub fn build(&self, descriptions: &[TableDescription]) -> Manifest {
        let live: Vec<&TableDescription> = descriptions
            .iter()
            .filter(|d| d.sync_status != SyncStatus::Deprecated)
            .collect();

        let mut manifest = Manifest::new(self.catalog.clone(), self.schema.clone());
        manifest.data_source = self.data_source.clone();

        let mut seen = HashSet::new();
        for desc in &live {
            if !seen.insert(desc.table_name()) {
                log::warn!("Skipping duplicate table description {}", desc.key);
                continue;
            }
            manifest.models.push(self.model_from_description(desc));
        }

        manifest.relationships = foreign_key_relationships(&live, &manifest);

        if self.infer_relationships {
            let mut inferred = apply_inferred(&manifest);
            inferred.version = manifest.version;
            return inferred;
        }
        manifest
    }

    fn model_from_description(&self, desc: &TableDescription) -> Model {
        let mut model = Model::new(desc.table_name());
        model.source = Some(ModelSource::TableReference(TableReference {
            catalog: Some(self.catalog.clone()),
            schema: Some(desc.key.schema.clone()),
            table: desc.table_name().to_string(),
        }));
        model.primary_key = desc.primary_key_columns().next().map(|c| c.name.clone());
        if let Some(text) = &desc.description {
            model
                .properties
                .insert(DESCRIPTION_PROPERTY.to_string(), text.clone());
        }

        model.columns = desc
            .columns
            .iter()
            .map(|c| {
                let mut column = Column::plain(c.name.clone(), c.data_type.clone());
                column.not_null = c.is_primary_key;
                if let Some(text) = &c.description {
                    column
                        .properties
                        .insert(DESCRIPTION_PROPERTY.to_string(), text.clone());
                }
                if let Some(categories) = &c.categories {
                    column
                        .properties
                        .insert(CATEGORIES_PROPERTY.to_string(), categories.join(","));
                }
                column
            })
            .collect();
        model
    }
}

/// One `MANY_TO_ONE` relationship per foreign-key column.
///
/// Foreign keys pointing at a table that is not a model of `manifest` are
/// skipped so no relationship ever dangles.
fn foreign_key_relationships(
    descriptions: &[&TableDescription],
    manifest: &Manifest,
) -> Vec<Relationship> {
    let mut names = HashSet::new();
    let mut relationships = Vec::new();

    for desc in descriptions {
        let source = desc.table_name();
        for column in &desc.columns {
            let Some(fk) = &column.foreign_key else {
                continue;
            };
            if manifest.model(&fk.reference_table).is_none() {
                log::debug!(
                    "Foreign key {}.{} references {} which is not in the manifest",
                    source,
                    column.name,
                    fk.reference_table
                );
                continue;
            }

            let condition = format!(
                "{}.{} = {}.{}",
                source, column.name, fk.reference_table, fk.field_name
            );
            let name =
                unique_relationship_name(&names, source, &fk.reference_table, &column.name);
            names.insert(name.clone());
            relationships.push(Relationship::new(
                name,
                source,
                fk.reference_table.clone(),
                JoinType::ManyToOne,
                condition,
            ));
        }
    }
    relationships
}

/// Insert `model`, replacing any model with the same name wholesale.
pub fn add_model(manifest: &Manifest, model: Model) -> Manifest {
    let mut next = manifest.clone();
    match next.models.iter_mut().find(|m| m.name == model.name) {
        Some(existing) => *existing = model,
        None => next.models.push(model),
    }
    next.touch();
    next
}

/// Remove a model and every relationship that references it.
///
/// Columns elsewhere that pointed at a removed relationship lose their
/// `relationship` link.
pub fn remove_model(manifest: &Manifest, name: &str) -> Manifest {
    let mut next = manifest.clone();
    next.models.retain(|m| m.name != name);
    let removed = drain_relationships(&mut next, |r| r.references(name));
    unlink_columns(&mut next, &removed);
    next.touch();
    next
}

/// Insert `relationship`, replacing any relationship with the same name.
pub fn add_relationship(manifest: &Manifest, relationship: Relationship) -> Manifest {
    let mut next = manifest.clone();
    match next
        .relationships
        .iter_mut()
        .find(|r| r.name == relationship.name)
    {
        Some(existing) => *existing = relationship,
        None => next.relationships.push(relationship),
    }
    next.touch();
    next
}

/// Remove the relationship with exactly this name, unlinking any column
/// that pointed at it.
pub fn remove_relationship(manifest: &Manifest, name: &str) -> Manifest {
    let mut next = manifest.clone();
    let removed = drain_relationships(&mut next, |r| r.name == name);
    unlink_columns(&mut next, &removed);
    next.touch();
    next
}

/// Remove matching relationships, returning their names
fn drain_relationships<F>(manifest: &mut Manifest, matches: F) -> HashSet<String>
where
    F: Fn(&Relationship) -> bool,
{
    let (removed, kept) = std::mem::take(&mut manifest.relationships)
        .into_iter()
        .partition::<Vec<_>, _>(|r| matches(r));
    manifest.relationships = kept;
    removed.into_iter().map(|r| r.name).collect()
}

fn unlink_columns(manifest: &mut Manifest, removed: &HashSet<String>) {
    if removed.is_empty() {
        return;
    }
    let columns = manifest
        .models
        .iter_mut()
        .flat_map(|m| m.columns.iter_mut())
        .chain(
            manifest
                .metrics
                .iter_mut()
                .flat_map(|m| m.dimensions.iter_mut().chain(m.measures.iter_mut())),
        );
    for column in columns {
        if column
            .relationship
            .as_ref()
            .is_some_and(|r| removed.contains(r))
        {
            column.relationship = None;
        }
    }
}

/// Swap in a freshly built manifest, keeping the creation time of `manifest`.
///
/// The revision is bumped only when the structure actually changed.
pub fn replace_content(manifest: &Manifest, rebuilt: Manifest) -> Manifest {
    if rebuilt.without_bookkeeping() == manifest.without_bookkeeping() {
        return manifest.clone();
    }
    let mut next = Manifest {
        version: manifest.version,
        created_at: manifest.created_at,
        updated_at: manifest.updated_at,
        ..rebuilt
    };
    next.touch();
    next
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;
