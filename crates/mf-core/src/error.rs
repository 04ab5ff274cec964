//! Error types for mf-core

use thiserror::Error;

/// Core error type for Manifold
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Configuration file is not valid YAML for [`crate::Config`]
    #[error("[E002] Failed to parse config '{path}': {source}")]
    ConfigParseError {
        path: String,
        source: serde_yaml::Error,
    },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Manifest violates one of its structural invariants
    #[error("[E004] Invalid manifest: {message}")]
    ManifestInvariant { message: String },

    /// E005: Unknown sync status token
    #[error("[E005] Unknown sync status '{value}'")]
    UnknownSyncStatus { value: String },

    /// E006: IO error with file path context
    #[error("[E006] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
