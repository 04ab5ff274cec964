//! Validate command implementation

use anyhow::{Context, Result};
use mf_core::codec;
use std::fs;

use crate::cli::ValidateArgs;
use crate::commands::common::ExitCode;

/// Execute the validate command
pub async fn execute(args: &ValidateArgs) -> Result<()> {
    let content =
        fs::read_to_string(&args.file).with_context(|| format!("Failed to read {}", args.file))?;

    match codec::from_json(&content) {
        Ok(manifest) => {
            println!(
                "{}: valid ({}.{}, {} models, {} relationships)",
                args.file,
                manifest.catalog,
                manifest.schema,
                manifest.models.len(),
                manifest.relationships.len()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{}: {}", args.file, e);
            Err(ExitCode(1).into())
        }
    }
}
