//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use mf_core::{Config, EngineType};
use mf_db::DuckDbBackend;
use mf_meta::MetaDb;
use mf_scan::SchemaScanner;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and the metadata store is closed cleanly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; the command has already reported the failure.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// A loaded project: its root directory and parsed configuration
#[derive(Debug)]
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

/// Load `manifold.yml` from the project directory, or the `--config` file.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load project configuration")?;
    verbose(
        global,
        format_args!("Loaded project '{}' from {}", config.name, root.display()),
    );
    Ok(Project { root, config })
}

/// Open the configured source database
pub(crate) fn open_engine(project: &Project) -> Result<DuckDbBackend> {
    match project.config.connection.engine {
        EngineType::DuckDb => {
            let path = project.config.database_path_absolute(&project.root);
            DuckDbBackend::new(&path)
                .with_context(|| format!("Failed to connect to database at {}", path))
        }
    }
}

/// Open (creating if needed) the metadata store
pub(crate) fn open_meta_db(project: &Project) -> Result<MetaDb> {
    let path = project.config.meta_path_absolute(&project.root);
    MetaDb::open(&path)
        .with_context(|| format!("Failed to open metadata store at {}", path.display()))
}

/// Scanner wired to the project's profiler and sampling settings
pub(crate) fn scanner<'a>(
    project: &Project,
    engine: &'a DuckDbBackend,
    meta: &'a MetaDb,
) -> SchemaScanner<'a> {
    SchemaScanner::new(engine, meta)
        .with_profiler_config(project.config.profiler)
        .with_sample_rows(project.config.scan.sample_rows)
}

/// Print a `[verbose]` line to stderr when `--verbose` is set
pub(crate) fn verbose(global: &GlobalArgs, message: fmt::Arguments<'_>) {
    if global.verbose {
        eprintln!("[verbose] {}", message);
    }
}

/// Split a comma-separated CLI list, dropping empty entries
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Plural suffix for counts in summaries
pub(crate) fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
