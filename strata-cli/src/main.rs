//! Strata CLI - schema snapshots, diffs and migrations.

use clap::Parser;

use strata_cli::cli::{Cli, Command};
use strata_cli::commands;
use strata_cli::config::{Config, LoggingConfig};
use strata_cli::error::CliResult;
use strata_cli::{logging, output};

#[tokio::main]
async fn main() {
    // Run the CLI and handle errors
    if let Err(e) = run().await {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // A missing config is reported by the command that needs it
    let logging_config = Config::load(&cli.config)
        .map(|config| config.logging)
        .unwrap_or_else(|_| LoggingConfig::default());
    logging::init(&logging_config);

    let config = cli.config.as_path();
    match cli.command {
        Command::Init(args) => commands::init::run(args).await,
        Command::Snapshot(args) => commands::snapshot::run(config, args).await,
        Command::Diff(args) => commands::diff::run(config, args).await,
        Command::Patch(args) => commands::diff::run_patch(config, args).await,
        Command::Apply(args) => commands::apply::run(config, args).await,
        Command::ApplyPatch(args) => commands::apply::run_patch(config, args).await,
        Command::Hash(args) => commands::hash::run(args).await,
        Command::Version => commands::version::run().await,
    }
}
