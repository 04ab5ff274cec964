//! Export command implementation

use anyhow::{Context, Result};
use mf_core::{codec, ManifestService, ManifestStore};
use std::path::PathBuf;

use crate::cli::{ExportArgs, GlobalArgs};
use crate::commands::build::write_manifest;
use crate::commands::common::{self, load_project, open_meta_db, ExitCode};

/// Execute the export command
pub async fn execute(args: &ExportArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let service = ManifestService::new(open_meta_db(&project)?);
    let owner = &project.config.manifest.owner;

    let stored = match args.id {
        Some(id) => service.require(id)?,
        None => match service
            .store()
            .get_by_owner(owner)
            .context("Failed to look up stored manifest")?
        {
            Some(stored) => stored,
            None => {
                eprintln!("No manifest stored for owner '{}'. Run `mf build` first.", owner);
                return Err(ExitCode(1).into());
            }
        },
    };
    common::verbose(
        global,
        format_args!("Exporting manifest {} (owner '{}')", stored.id, stored.owner_id),
    );

    match args.output.as_deref() {
        Some("-") => {
            let json = codec::to_json(&stored.manifest).context("Failed to encode manifest")?;
            println!("{}", json);
        }
        other => {
            let path = match other {
                Some(p) => PathBuf::from(p),
                None => project.config.manifest_output_absolute(&project.root),
            };
            write_manifest(&stored.manifest, &path)?;
            println!("Wrote manifest {} to {}", stored.id, path.display());
        }
    }
    Ok(())
}
