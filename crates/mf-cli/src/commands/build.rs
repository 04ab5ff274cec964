//! Build command implementation
//!
//! Turns the stored descriptions of the configured schema into a manifest,
//! stores it under the configured owner and writes its wire JSON.

use anyhow::{Context, Result};
use mf_core::{
    codec, Manifest, ManifestBuilder, ManifestService, ManifestStore, SyncStatus,
    TableDescriptionStore,
};
use std::fs;
use std::path::Path;

use crate::cli::{BuildArgs, GlobalArgs};
use crate::commands::common::{self, load_project, open_meta_db, plural, Project};

/// Execute the build command
pub async fn execute(args: &BuildArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let meta = open_meta_db(&project)?;
    let config = &project.config;

    let descriptions = meta
        .list_descriptions(&config.connection.id, &config.schema)
        .context("Failed to read stored descriptions")?;
    let pending = descriptions
        .iter()
        .filter(|d| !matches!(d.sync_status, SyncStatus::Scanned | SyncStatus::Deprecated))
        .count();
    if pending > 0 {
        eprintln!(
            "[warn] {} table{} not scanned; their models will have no columns",
            pending,
            plural(pending)
        );
    }

    let manifest = builder_for(&project, args).build(&descriptions);
    common::verbose(
        global,
        format_args!(
            "Built {} models, {} relationships",
            manifest.models.len(),
            manifest.relationships.len()
        ),
    );

    let service = ManifestService::new(meta);
    let owner = &config.manifest.owner;
    let existing = if args.new {
        None
    } else {
        service
            .store()
            .get_by_owner(owner)
            .context("Failed to look up stored manifest")?
    };

    let stored = match existing {
        Some(current) => service
            .replace(current.id, manifest)
            .with_context(|| format!("Failed to update manifest {}", current.id))?,
        None => {
            let id = service
                .save_new(owner, &manifest)
                .context("Failed to store manifest")?;
            service.require(id)?
        }
    };

    println!(
        "Manifest {} (revision {}): {} model{}, {} relationship{}",
        stored.id,
        stored.manifest.version,
        stored.manifest.models.len(),
        plural(stored.manifest.models.len()),
        stored.manifest.relationships.len(),
        plural(stored.manifest.relationships.len())
    );

    if !args.no_write {
        let output = config.manifest_output_absolute(&project.root);
        write_manifest(&stored.manifest, &output)?;
        println!("Wrote {}", output.display());
    }
    Ok(())
}

fn builder_for(project: &Project, args: &BuildArgs) -> ManifestBuilder {
    let config = &project.config;
    ManifestBuilder::new(config.catalog_name(), config.schema.clone())
        .data_source(config.manifest.data_source.clone())
        .infer_relationships(config.manifest.infer_relationships && !args.no_infer)
}

/// Write wire JSON, creating parent directories
pub(crate) fn write_manifest(manifest: &Manifest, path: &Path) -> Result<()> {
    let json = codec::to_json(manifest).context("Failed to encode manifest")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
