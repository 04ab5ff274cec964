//! Scan command implementation

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use mf_core::{SyncStatus, TableDescription};
use mf_scan::{ScanReport, SyncStateTracker};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::cli::{GlobalArgs, ScanArgs};
use crate::commands::common::{
    self, load_project, open_engine, open_meta_db, plural, split_list, ExitCode,
};
use crate::commands::refresh;

/// Execute the scan command
pub async fn execute(args: &ScanArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let schema = project.config.schema.clone();

    if args.refresh {
        let report = refresh::run_refresh(&project, &schema, global).await?;
        println!(
            "Refreshed: {} new, {} deprecated",
            report.inserted.len(),
            report.deprecated.len()
        );
    }

    let engine = open_engine(&project)?;
    let meta = open_meta_db(&project)?;
    let tracker = SyncStateTracker::new(common::scanner(&project, &engine, &meta));

    let stored = tracker
        .descriptions(&project.config.connection.id, &schema)
        .context("Failed to read stored descriptions")?;
    if stored.is_empty() {
        println!("No stored tables for this schema. Run `mf refresh` first.");
        return Ok(());
    }

    let ids = select_targets(&stored, args)?;
    if ids.is_empty() {
        println!("Nothing to scan.");
        return Ok(());
    }
    common::verbose(global, format_args!("Scanning table ids {:?}", ids));

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_message(format!("Scanning {} table{}", ids.len(), plural(ids.len())));
    progress.enable_steady_tick(Duration::from_millis(100));

    let result = tracker.scan_tables(&ids).await;
    progress.finish_and_clear();
    let report = result.context("Scan aborted")?;

    print_report(&report);
    if !report.failed.is_empty() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

/// Ids to scan: the named tables, or every pending one.
///
/// Without `--tables`, pending means `NOT_SCANNED`, `FAILED` or left
/// `SYNCHRONIZING` by an interrupted run; `--all` adds already scanned
/// tables. Deprecated tables are only scanned by name.
fn select_targets(stored: &[TableDescription], args: &ScanArgs) -> Result<Vec<i64>> {
    if let Some(list) = &args.tables {
        let wanted: BTreeSet<String> = split_list(list).into_iter().collect();
        let mut ids = Vec::new();
        for name in &wanted {
            let desc = stored
                .iter()
                .find(|d| d.table_name() == name)
                .with_context(|| format!("Unknown table '{}'; run `mf refresh` first", name))?;
            ids.extend(desc.id);
        }
        return Ok(ids);
    }

    Ok(stored
        .iter()
        .filter(|d| match d.sync_status {
            SyncStatus::NotScanned | SyncStatus::Failed | SyncStatus::Synchronizing => true,
            SyncStatus::Scanned => args.all,
            SyncStatus::Deprecated => false,
        })
        .filter_map(|d| d.id)
        .collect())
}

fn print_report(report: &ScanReport) {
    println!("Scan {}", report.batch_id);
    for key in &report.scanned {
        println!("  [ok]   {}", key.table_name);
    }
    for (key, message) in &report.failed {
        println!("  [fail] {}: {}", key.table_name, message);
    }
    println!();
    println!(
        "{} scanned, {} failed",
        report.scanned.len(),
        report.failed.len()
    );
}

#[cfg(test)]
#[path = "scan_test.rs"]
mod tests;
