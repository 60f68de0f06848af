//! `certwatch rescan` - One-shot full resynchronization.

use anyhow::Result;
use colored::Colorize;

use certwatch_sync::SyncEngine;

use super::Context;
use crate::output::OutputFormat;

pub async fn execute(ctx: Context) -> Result<()> {
    let index = ctx.open_index().await?;
    let engine = SyncEngine::new(index, &ctx.config);
    let summary = engine.rescan_all().await?;

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Pretty => {
            println!("{}", "Rescan complete".bold().underline());
            println!("  {} {}", "Archives seen:".bold(), summary.seen);
            println!("  {} {}", "Synced:".bold(), summary.synced.to_string().green());
            let failed = summary.failed.to_string();
            if summary.failed > 0 {
                println!("  {} {}", "Failed:".bold(), failed.red());
            } else {
                println!("  {} {}", "Failed:".bold(), failed);
            }
            println!("  {} {}", "Pruned:".bold(), summary.pruned);
            println!("  {} {}", "Certificates:".bold(), summary.records.to_string().cyan());
        }
    }

    Ok(())
}
