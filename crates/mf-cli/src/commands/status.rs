//! Status command implementation

use anyhow::{Context, Result};
use mf_core::{SyncStatus, TableDescription, TableDescriptionStore};

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::{load_project, open_meta_db};

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let meta = open_meta_db(&project)?;

    let descriptions = meta
        .list_descriptions(&project.config.connection.id, &project.config.schema)
        .context("Failed to read stored descriptions")?;

    match args.output {
        StatusOutput::Json => {
            let json = serde_json::to_string_pretty(&descriptions)
                .context("Failed to serialize descriptions")?;
            println!("{}", json);
        }
        StatusOutput::Table => print_table(&descriptions),
    }
    Ok(())
}

fn print_table(descriptions: &[TableDescription]) {
    if descriptions.is_empty() {
        println!("No stored tables. Run `mf refresh` first.");
        return;
    }

    let width = descriptions
        .iter()
        .map(|d| d.table_name().len())
        .max()
        .unwrap_or(0)
        .max("TABLE".len());

    println!(
        "{:<width$}  {:<13}  {:>7}  {:<20}",
        "TABLE",
        "STATUS",
        "COLUMNS",
        "LAST SYNC",
        width = width
    );
    for desc in descriptions {
        let last_sync = desc
            .last_sync
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<width$}  {:<13}  {:>7}  {:<20}",
            desc.table_name(),
            desc.sync_status.as_str(),
            desc.columns.len(),
            last_sync,
            width = width
        );
        if desc.sync_status == SyncStatus::Failed {
            if let Some(message) = &desc.error_message {
                println!("{:<width$}  error: {}", "", message, width = width);
            }
        }
    }

    println!();
    println!("{}", summary(descriptions));
}

/// One-line count per sync status, in lifecycle order
fn summary(descriptions: &[TableDescription]) -> String {
    [
        SyncStatus::NotScanned,
        SyncStatus::Synchronizing,
        SyncStatus::Scanned,
        SyncStatus::Failed,
        SyncStatus::Deprecated,
    ]
    .iter()
    .filter_map(|status| {
        let count = descriptions
            .iter()
            .filter(|d| d.sync_status == *status)
            .count();
        (count > 0).then(|| format!("{} {}", count, status.as_str()))
    })
    .collect::<Vec<_>>()
    .join(", ")
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
