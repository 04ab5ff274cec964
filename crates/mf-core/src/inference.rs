//! Naming-convention relationship inference.
//!
//! Looks for `<entity>_id` columns and matches `<entity>` against model
//! names, trying the plural spellings a schema is likely to use. The first
//! candidate that names another model wins. There is no scoring: a column
//! like `category_id` will link to any model called `categories`, related or
//! not.

use crate::manifest::{JoinType, Manifest, Model, Relationship};
use std::collections::HashSet;

const ID_SUFFIX: &str = "_id";

/// Candidate target model names for a foreign-key base name, in match order.
///
/// `customer` → `customer`, `customers`, `customeres`;
/// `category` → `category`, `categorys`, `categoryes`, `categories`.
pub fn candidate_targets(base: &str) -> Vec<String> {
    let mut candidates = vec![
        base.to_string(),
        format!("{base}s"),
        format!("{base}es"),
    ];
    if let Some(stem) = base.strip_suffix('y') {
        candidates.push(format!("{stem}ies"));
    }
    candidates
}

/// Pick a relationship name that is not yet taken.
///
/// Tries `{from}_{to}`, then `{from}_{to}_{column}`, then numbered variants
/// of the latter.
pub(crate) fn unique_relationship_name(
    taken: &HashSet<String>,
    from: &str,
    to: &str,
    column: &str,
) -> String {
    let base = format!("{from}_{to}");
    if !taken.contains(&base) {
        return base;
    }
    let with_column = format!("{base}_{column}");
    if !taken.contains(&with_column) {
        return with_column;
    }
    (2..)
        .map(|n| format!("{with_column}_{n}"))
        .find(|name| !taken.contains(name))
        .unwrap_or(with_column)
}

/// Derive `MANY_TO_ONE` relationships from `_id` column names.
///
/// Returns only the new relationships. A candidate is dropped when its
/// condition string already appears in `existing` or was produced earlier in
/// the same pass. Models and their columns are visited in order, so the
/// result is deterministic for a given input.
pub fn infer_relationships(models: &[Model], existing: &[Relationship]) -> Vec<Relationship> {
    let mut conditions: HashSet<String> = existing.iter().map(|r| r.condition.clone()).collect();
    let mut names: HashSet<String> = existing.iter().map(|r| r.name.clone()).collect();
    let mut inferred = Vec::new();

    for model in models {
        for column in &model.columns {
            let Some(base) = column.name.strip_suffix(ID_SUFFIX) else {
                continue;
            };
            if base.is_empty() {
                continue;
            }

            let Some(target) = candidate_targets(base).into_iter().find_map(|candidate| {
                models
                    .iter()
                    .find(|m| m.name == candidate && m.name != model.name)
            }) else {
                continue;
            };

            let condition = format!(
                "{}.{} = {}.{}",
                model.name,
                column.name,
                target.name,
                target.primary_key_or_default()
            );
            if conditions.contains(&condition) {
                continue;
            }

            let name = unique_relationship_name(&names, &model.name, &target.name, &column.name);
            log::debug!("Inferred relationship {name}: {condition}");

            conditions.insert(condition.clone());
            names.insert(name.clone());
            inferred.push(Relationship::new(
                name,
                model.name.clone(),
                target.name.clone(),
                JoinType::ManyToOne,
                condition,
            ));
        }
    }

    inferred
}

/// Second pass over a built manifest: append inferred relationships.
///
/// Existing relationships are never removed or altered. Returns the input
/// unchanged (same revision) when nothing new is found.
pub fn apply_inferred(manifest: &Manifest) -> Manifest {
    let inferred = infer_relationships(&manifest.models, &manifest.relationships);
    let mut next = manifest.clone();
    if inferred.is_empty() {
        return next;
    }
    next.relationships.extend(inferred);
    next.touch();
    next
}

#[cfg(test)]
#[path = "inference_test.rs"]
mod tests;
