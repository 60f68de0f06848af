//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::{Context as _, Result};
use args::{Cli, Commands};
use clap::Parser;

use certwatch_sync::SyncConfig;

use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    crate::logging::init(&cli.log_level, cli.log_format)?;

    let config = build_config(&cli)?;

    let ctx = commands::Context {
        config,
        output_format: cli.output.unwrap_or(OutputFormat::Pretty),
    };

    match cli.command {
        Commands::Run => commands::run::execute(ctx).await,
        Commands::Rescan => commands::rescan::execute(ctx).await,
        Commands::List(args) => commands::list::execute(ctx, args).await,
        Commands::Show(args) => commands::show::execute(ctx, args).await,
        Commands::Stats => commands::stats::execute(ctx).await,
        Commands::Export(args) => commands::export::execute(ctx, args).await,
        Commands::Fetch(args) => commands::fetch::execute(ctx, args).await,
    }
}

/// Config file and environment first, then command-line flags on top.
fn build_config(cli: &Cli) -> Result<SyncConfig> {
    let mut config = SyncConfig::load(cli.config.as_deref()).context("loading configuration")?;

    if let Some(dir) = &cli.archive_dir {
        config.archive_dir.clone_from(dir);
    }
    if let Some(db) = &cli.database {
        config.database_path.clone_from(db);
    }
    if let Some(days) = cli.threshold_days {
        config.threshold_days = days;
    }
    if let Some(secs) = cli.scan_interval {
        config.scan_interval_secs = secs;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}
