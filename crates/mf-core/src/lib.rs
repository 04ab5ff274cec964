//! mf-core - Core library for Manifold
//!
//! This crate provides the table description and manifest data model, the
//! manifest builder, relationship inference, the wire codec, the persistence
//! traits and configuration parsing shared by all Manifold components.

pub mod builder;
pub mod checksum;
pub mod codec;
pub mod config;
pub mod description;
pub mod error;
pub mod inference;
pub mod manifest;
pub(crate) mod serde_helpers;
pub mod service;
pub mod sql_utils;
pub mod store;

pub use builder::ManifestBuilder;
pub use checksum::compute_checksum;
pub use codec::{CodecError, CodecResult, MANIFEST_JSON_SCHEMA};
pub use config::{Config, EngineType};
pub use description::{
    ColumnDescription, ColumnProfile, ExampleRow, ForeignKeyRef, SyncStatus, TableDescription,
    TableKey,
};
pub use error::{CoreError, CoreResult};
pub use inference::infer_relationships;
pub use manifest::{
    Column, ColumnKind, DatePart, EnumDefinition, EnumValue, JoinType, Manifest, Metric, Model,
    ModelSource, Properties, Relationship, TableReference, TimeGrain, View,
};
pub use service::{ManifestService, ServiceError, ServiceResult};
pub use store::{
    ManifestFilter, ManifestStore, StoreError, StoreResult, StoredManifest, TableDescriptionStore,
};
