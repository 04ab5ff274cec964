//! Read-modify-write access to stored manifests.

use crate::builder;
use crate::error::CoreError;
use crate::manifest::{Manifest, Model, Relationship};
use crate::store::{ManifestStore, StoreError, StoredManifest};
use thiserror::Error;

/// Manifest service errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// M001: No manifest with this id
    #[error("[M001] Manifest {id} not found")]
    ManifestNotFound { id: i64 },

    /// M002: Mutation would break a manifest invariant
    #[error("[M002] {0}")]
    Invalid(#[from] CoreError),

    /// M003: Underlying store failed
    #[error("[M003] {0}")]
    Store(#[from] StoreError),
}

/// Result type alias for ServiceError
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Manifest operations on top of a [`ManifestStore`]
pub struct ManifestService<S> {
    store: S,
}

impl<S: ManifestStore> ManifestService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the wrapped store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch a manifest that must exist
    pub fn require(&self, id: i64) -> ServiceResult<StoredManifest> {
        self.store
            .get(id)?
            .ok_or(ServiceError::ManifestNotFound { id })
    }

    /// Persist a freshly built manifest
    pub fn save_new(&self, owner_id: &str, manifest: &Manifest) -> ServiceResult<i64> {
        manifest.check_invariants()?;
        let id = self.store.create(owner_id, manifest)?;
        log::debug!("Stored manifest {} for owner '{}'", id, owner_id);
        Ok(id)
    }

    /// Apply a pure mutation to a stored manifest and write the result back.
    ///
    /// Nothing is written when the mutated manifest fails
    /// [`Manifest::check_invariants`].
    pub fn modify<F>(&self, id: i64, f: F) -> ServiceResult<StoredManifest>
    where
        F: FnOnce(&Manifest) -> Manifest,
    {
        let mut stored = self.require(id)?;
        let updated = f(&stored.manifest);
        updated.check_invariants()?;
        stored.manifest = updated;
        self.store.update(&stored)?;
        self.require(id)
    }

    /// Replace a stored manifest with a rebuilt one
    pub fn replace(&self, id: i64, rebuilt: Manifest) -> ServiceResult<StoredManifest> {
        self.modify(id, |m| builder::replace_content(m, rebuilt))
    }

    pub fn add_model(&self, id: i64, model: Model) -> ServiceResult<StoredManifest> {
        self.modify(id, |m| builder::add_model(m, model))
    }

    pub fn remove_model(&self, id: i64, name: &str) -> ServiceResult<StoredManifest> {
        self.modify(id, |m| builder::remove_model(m, name))
    }

    pub fn add_relationship(
        &self,
        id: i64,
        relationship: Relationship,
    ) -> ServiceResult<StoredManifest> {
        self.modify(id, |m| builder::add_relationship(m, relationship))
    }

    pub fn remove_relationship(&self, id: i64, name: &str) -> ServiceResult<StoredManifest> {
        self.modify(id, |m| builder::remove_relationship(m, name))
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
