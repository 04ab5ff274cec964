//! Configuration types and parsing for manifold.yml

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::default_true;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main project configuration from manifold.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Source database connection
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Schema to scan
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Catalog name recorded in manifests (defaults to the DuckDB file stem)
    #[serde(default)]
    pub catalog: Option<String>,

    /// Path of the metadata store, relative to the project directory
    #[serde(default = "default_meta_path")]
    pub meta_path: String,

    /// Column profiling thresholds
    #[serde(default)]
    pub profiler: ProfilerConfig,

    /// Scan settings
    #[serde(default)]
    pub scan: ScanConfig,

    /// Manifest build settings
    #[serde(default)]
    pub manifest: ManifestConfig,
}

/// Engine type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    /// DuckDB (default)
    #[default]
    DuckDb,
}

impl std::fmt::Display for EngineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineType::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// Source database connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Stable connection identifier, part of every table key
    #[serde(default = "default_connection_id")]
    pub id: String,

    /// Engine type
    #[serde(rename = "type", default)]
    pub engine: EngineType,

    /// Database path (DuckDB file or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            id: default_connection_id(),
            engine: EngineType::default(),
            path: default_db_path(),
        }
    }
}

/// Column profiling thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilerConfig {
    /// Samples longer than this mark a column high-cardinality
    #[serde(default = "default_max_sample_length")]
    pub max_sample_length: usize,

    /// Lower bound (inclusive) on distinct values for a low-cardinality column
    #[serde(default = "default_min_distinct")]
    pub min_distinct: u64,

    /// Upper bound (inclusive) on distinct values for a low-cardinality column
    #[serde(default = "default_max_distinct")]
    pub max_distinct: u64,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            max_sample_length: default_max_sample_length(),
            min_distinct: default_min_distinct(),
            max_distinct: default_max_distinct(),
        }
    }
}

/// Scan settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// Example rows captured per table
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            sample_rows: default_sample_rows(),
        }
    }
}

/// Manifest build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestConfig {
    /// Data-source tag written into built manifests
    #[serde(default = "default_data_source")]
    pub data_source: String,

    /// Run relationship inference after building
    #[serde(default = "default_true")]
    pub infer_relationships: bool,

    /// Output file for `mf export`, relative to the project directory
    #[serde(default = "default_manifest_output")]
    pub output: String,

    /// Owner id manifests are stored under
    #[serde(default = "default_owner")]
    pub owner: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            data_source: default_data_source(),
            infer_relationships: true,
            output: default_manifest_output(),
            owner: default_owner(),
        }
    }
}

fn default_schema() -> String {
    "main".to_string()
}

fn default_connection_id() -> String {
    "default".to_string()
}

fn default_db_path() -> String {
    ":memory:".to_string()
}

fn default_meta_path() -> String {
    "target/meta.duckdb".to_string()
}

fn default_max_sample_length() -> usize {
    50
}

fn default_min_distinct() -> u64 {
    1
}

fn default_max_distinct() -> u64 {
    60
}

fn default_sample_rows() -> usize {
    crate::description::MAX_EXAMPLE_ROWS
}

fn default_data_source() -> String {
    "duckdb".to_string()
}

fn default_manifest_output() -> String {
    "target/manifest.json".to_string()
}

fn default_owner() -> String {
    "default".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                path: path.display().to_string(),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for manifold.yml or manifold.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("manifold.yml");
        let yaml_path = dir.join("manifold.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }
        if self.schema.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "schema cannot be empty".to_string(),
            });
        }
        if self.connection.id.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "connection.id cannot be empty".to_string(),
            });
        }
        if self.profiler.min_distinct > self.profiler.max_distinct {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "profiler.min_distinct ({}) is greater than profiler.max_distinct ({})",
                    self.profiler.min_distinct, self.profiler.max_distinct
                ),
            });
        }
        if self.profiler.max_sample_length == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "profiler.max_sample_length must be positive".to_string(),
            });
        }
        if self.scan.sample_rows > crate::description::MAX_EXAMPLE_ROWS {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "scan.sample_rows cannot exceed {}",
                    crate::description::MAX_EXAMPLE_ROWS
                ),
            });
        }
        Ok(())
    }

    /// Catalog recorded in manifests: explicit setting, else the database
    /// file stem, else `memory`.
    pub fn catalog_name(&self) -> String {
        if let Some(catalog) = &self.catalog {
            return catalog.clone();
        }
        if self.connection.path == ":memory:" {
            return "memory".to_string();
        }
        Path::new(&self.connection.path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "memory".to_string())
    }

    /// Database path resolved against the project root
    pub fn database_path_absolute(&self, root: &Path) -> String {
        if self.connection.path == ":memory:" {
            return self.connection.path.clone();
        }
        resolve(root, &self.connection.path).display().to_string()
    }

    /// Metadata store path resolved against the project root
    pub fn meta_path_absolute(&self, root: &Path) -> PathBuf {
        resolve(root, &self.meta_path)
    }

    /// Manifest output path resolved against the project root
    pub fn manifest_output_absolute(&self, root: &Path) -> PathBuf {
        resolve(root, &self.manifest.output)
    }
}

fn resolve(root: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
