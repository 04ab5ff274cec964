//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Manifold - turn a live database schema into a semantic manifest
#[derive(Parser, Debug)]
#[command(name = "mf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync stored table descriptions with the live schema
    Refresh(RefreshArgs),

    /// Profile tables and store their descriptions
    Scan(ScanArgs),

    /// Show stored table descriptions and their sync state
    Status(StatusArgs),

    /// Build a manifest from scanned tables and store it
    Build(BuildArgs),

    /// Write a stored manifest as wire JSON
    Export(ExportArgs),

    /// Check a wire JSON manifest file
    Validate(ValidateArgs),

    /// Print the JSON Schema of the wire format
    Schema,
}

/// Arguments for the refresh command
#[derive(Args, Debug, Default)]
pub struct RefreshArgs {
    /// Schema to refresh (default: from config)
    #[arg(short, long)]
    pub schema: Option<String>,
}

/// Arguments for the scan command
#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Table names to scan (comma-separated, default: all pending)
    #[arg(short, long)]
    pub tables: Option<String>,

    /// Rescan tables that are already scanned
    #[arg(long)]
    pub all: bool,

    /// Run refresh before scanning
    #[arg(long)]
    pub refresh: bool,
}

/// Arguments for the status command
#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusOutput {
    /// Table format
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Arguments for the build command
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Skip name-based relationship inference
    #[arg(long)]
    pub no_infer: bool,

    /// Store a new manifest instead of replacing the owner's latest one
    #[arg(long)]
    pub new: bool,

    /// Do not write the wire JSON to the configured output path
    #[arg(long)]
    pub no_write: bool,
}

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Manifest id (default: latest manifest of the configured owner)
    #[arg(long)]
    pub id: Option<i64>,

    /// Output file, `-` for stdout (default: from config)
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Wire JSON manifest file to check
    pub file: String,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
