//! Persistence seams for table descriptions and manifests.
//!
//! The scanner and the manifest service talk to these traits; `mf-meta`
//! provides the DuckDB-backed implementation.

use crate::description::{SyncStatus, TableDescription, TableKey};
use crate::manifest::Manifest;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// S001: Backend query failed
    #[error("[S001] Store query failed: {0}")]
    Query(String),

    /// S002: Stored row could not be decoded
    #[error("[S002] Stored data is corrupt: {0}")]
    Corrupt(String),

    /// S003: Row to update does not exist
    #[error("[S003] No stored {kind} with id {id}")]
    NotFound { kind: &'static str, id: i64 },
}

/// Result type alias for StoreError
pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed storage of [`TableDescription`]s.
///
/// Rows are upserted by [`TableKey`] and never deleted.
pub trait TableDescriptionStore {
    /// Insert or replace the row for `desc.key`, returning its id
    fn upsert_description(&self, desc: &TableDescription) -> StoreResult<i64>;

    /// Fetch one row by key
    fn get_description(&self, key: &TableKey) -> StoreResult<Option<TableDescription>>;

    /// Fetch one row by store id
    fn get_description_by_id(&self, id: i64) -> StoreResult<Option<TableDescription>>;

    /// All rows of one connection and schema, ordered by table name
    fn list_descriptions(
        &self,
        connection_id: &str,
        schema: &str,
    ) -> StoreResult<Vec<TableDescription>>;

    /// Set the status of many rows at once, returning the number updated
    fn set_sync_status(&self, ids: &[i64], status: SyncStatus) -> StoreResult<usize>;
}

/// A manifest together with its storage bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct StoredManifest {
    pub id: i64,
    pub owner_id: String,
    pub manifest: Manifest,
    /// SHA-256 of the canonical wire export
    pub checksum: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter for [`ManifestStore::list`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestFilter {
    pub owner_id: Option<String>,
    pub catalog: Option<String>,
    pub schema: Option<String>,
}

impl ManifestFilter {
    /// Filter on owner
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Self::default()
        }
    }
}

/// Storage of [`Manifest`] documents
pub trait ManifestStore {
    /// Fetch a manifest by id
    fn get(&self, id: i64) -> StoreResult<Option<StoredManifest>>;

    /// Most recently updated manifest of an owner
    fn get_by_owner(&self, owner_id: &str) -> StoreResult<Option<StoredManifest>>;

    /// Page through manifests, newest first
    fn list(
        &self,
        filter: &ManifestFilter,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<StoredManifest>>;

    /// Persist a new manifest, returning its id
    fn create(&self, owner_id: &str, manifest: &Manifest) -> StoreResult<i64>;

    /// Replace the stored document of `stored.id`
    fn update(&self, stored: &StoredManifest) -> StoreResult<()>;

    /// Delete a manifest; returns whether a row was removed
    fn delete(&self, id: i64) -> StoreResult<bool>;
}
