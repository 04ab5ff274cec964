use super::*;
use crate::manifest::{JoinType, Model};
use crate::store::ManifestFilter;
use chrono::Utc;
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Default)]
struct MemoryStore {
    rows: RefCell<BTreeMap<i64, StoredManifest>>,
}

impl ManifestStore for MemoryStore {
    fn get(&self, id: i64) -> Result<Option<StoredManifest>, StoreError> {
        Ok(self.rows.borrow().get(&id).cloned())
    }

    fn get_by_owner(&self, owner_id: &str) -> Result<Option<StoredManifest>, StoreError> {
        Ok(self
            .rows
            .borrow()
            .values()
            .find(|m| m.owner_id == owner_id)
            .cloned())
    }

    fn list(
        &self,
        filter: &ManifestFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StoredManifest>, StoreError> {
        Ok(self
            .rows
            .borrow()
            .values()
            .filter(|m| filter.owner_id.as_deref().map_or(true, |o| o == m.owner_id))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn create(&self, owner_id: &str, manifest: &Manifest) -> Result<i64, StoreError> {
        let mut rows = self.rows.borrow_mut();
        let id = rows.len() as i64 + 1;
        let now = Utc::now();
        rows.insert(
            id,
            StoredManifest {
                id,
                owner_id: owner_id.to_string(),
                manifest: manifest.clone(),
                checksum: None,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    fn update(&self, stored: &StoredManifest) -> Result<(), StoreError> {
        let mut rows = self.rows.borrow_mut();
        match rows.get_mut(&stored.id) {
            Some(row) => {
                *row = stored.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                kind: "manifest",
                id: stored.id,
            }),
        }
    }

    fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.rows.borrow_mut().remove(&id).is_some())
    }
}

fn two_models() -> Manifest {
    let mut m = Manifest::new("memory", "main");
    m.models = vec![Model::new("orders"), Model::new("customers")];
    m
}

#[test]
fn test_require_missing_manifest() {
    let service = ManifestService::new(MemoryStore::default());
    let err = service.require(42).unwrap_err();
    assert!(matches!(err, ServiceError::ManifestNotFound { id: 42 }));
    assert!(err.to_string().contains("[M001]"));
}

#[test]
fn test_add_relationship_persists_and_bumps_version() {
    let service = ManifestService::new(MemoryStore::default());
    let id = service.save_new("alice", &two_models()).unwrap();

    let stored = service
        .add_relationship(
            id,
            Relationship::new(
                "orders_customers",
                "orders",
                "customers",
                JoinType::ManyToOne,
                "orders.customer_id = customers.id",
            ),
        )
        .unwrap();

    assert_eq!(stored.manifest.relationships.len(), 1);
    assert_eq!(stored.manifest.version, 2);
    assert_eq!(
        service.require(id).unwrap().manifest.relationships[0].name,
        "orders_customers"
    );
}

#[test]
fn test_dangling_relationship_is_not_written() {
    let service = ManifestService::new(MemoryStore::default());
    let id = service.save_new("alice", &two_models()).unwrap();

    let err = service
        .add_relationship(
            id,
            Relationship::new(
                "orders_ghost",
                "orders",
                "ghost",
                JoinType::ManyToOne,
                "orders.ghost_id = ghost.id",
            ),
        )
        .unwrap_err();

    assert!(matches!(err, ServiceError::Invalid(_)));
    let stored = service.require(id).unwrap();
    assert!(stored.manifest.relationships.is_empty());
    assert_eq!(stored.manifest.version, 1);
}

#[test]
fn test_remove_model_cascades_to_relationships() {
    let service = ManifestService::new(MemoryStore::default());
    let mut manifest = two_models();
    manifest.relationships.push(Relationship::new(
        "orders_customers",
        "orders",
        "customers",
        JoinType::ManyToOne,
        "orders.customer_id = customers.id",
    ));
    let id = service.save_new("alice", &manifest).unwrap();

    let stored = service.remove_model(id, "customers").unwrap();
    assert_eq!(stored.manifest.model_names(), vec!["orders"]);
    assert!(stored.manifest.relationships.is_empty());
}

#[test]
fn test_save_new_rejects_invalid_manifest() {
    let service = ManifestService::new(MemoryStore::default());
    let mut manifest = two_models();
    manifest.models.push(Model::new("orders"));
    assert!(service.save_new("alice", &manifest).is_err());
    assert!(service.store().get_by_owner("alice").unwrap().is_none());
}

#[test]
fn test_replace_swaps_content() {
    let service = ManifestService::new(MemoryStore::default());
    let id = service.save_new("alice", &two_models()).unwrap();

    let mut rebuilt = Manifest::new("memory", "main");
    rebuilt.models = vec![Model::new("orders")];
    let stored = service.replace(id, rebuilt).unwrap();
    assert_eq!(stored.manifest.model_names(), vec!["orders"]);
    assert_eq!(stored.manifest.version, 2);
}
