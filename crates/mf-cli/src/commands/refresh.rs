//! Refresh command implementation

use anyhow::{Context, Result};
use mf_scan::{RefreshReport, SyncStateTracker};

use crate::cli::{GlobalArgs, RefreshArgs};
use crate::commands::common::{self, load_project, open_engine, open_meta_db, Project};

/// Execute the refresh command
pub async fn execute(args: &RefreshArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let schema = args
        .schema
        .clone()
        .unwrap_or_else(|| project.config.schema.clone());

    let report = run_refresh(&project, &schema, global).await?;
    print_report(&project, &schema, &report);
    Ok(())
}

/// Refresh one schema; shared with `scan --refresh`
pub(crate) async fn run_refresh(
    project: &Project,
    schema: &str,
    global: &GlobalArgs,
) -> Result<RefreshReport> {
    let engine = open_engine(project)?;
    let meta = open_meta_db(project)?;
    let tracker = SyncStateTracker::new(common::scanner(project, &engine, &meta));

    let connection_id = &project.config.connection.id;
    common::verbose(
        global,
        format_args!("Listing relations of {}:{}", connection_id, schema),
    );
    tracker
        .refresh(connection_id, schema)
        .await
        .with_context(|| format!("Failed to refresh schema '{}'", schema))
}

fn print_report(project: &Project, schema: &str, report: &RefreshReport) {
    println!("Refreshed {}:{}", project.config.connection.id, schema);
    for key in &report.inserted {
        println!("  + {}", key.table_name);
    }
    for key in &report.deprecated {
        println!("  - {} (deprecated)", key.table_name);
    }
    println!();
    println!(
        "{} new, {} deprecated, {} unchanged",
        report.inserted.len(),
        report.deprecated.len(),
        report.unchanged
    );
}
