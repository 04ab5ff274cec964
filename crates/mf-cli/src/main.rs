//! Manifold CLI - scan a database schema and build semantic manifests

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::common::ExitCode;
use commands::{build, export, refresh, scan, schema, status, validate};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = match &cli.command {
        cli::Commands::Refresh(args) => refresh::execute(args, &cli.global).await,
        cli::Commands::Scan(args) => scan::execute(args, &cli.global).await,
        cli::Commands::Status(args) => status::execute(args, &cli.global).await,
        cli::Commands::Build(args) => build::execute(args, &cli.global).await,
        cli::Commands::Export(args) => export::execute(args, &cli.global).await,
        cli::Commands::Validate(args) => validate::execute(args).await,
        cli::Commands::Schema => schema::execute().await,
    };

    if let Err(err) = &result {
        if let Some(code) = err.downcast_ref::<ExitCode>() {
            std::process::exit(code.0);
        }
    }
    result
}
