//! `certwatch stats` - Counts by status and issuer.

use anyhow::Result;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use certwatch_core::IndexStats;

use super::Context;
use crate::output::{truncate, OutputFormat};

#[derive(Tabled)]
struct IssuerRow {
    #[tabled(rename = "Issuer")]
    issuer: String,
    #[tabled(rename = "Certificates")]
    count: u64,
}

pub async fn execute(ctx: Context) -> Result<()> {
    let stats = ctx.with_index(|index| index.stats()).await?;

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Pretty => print_stats(&stats),
    }

    Ok(())
}

fn print_stats(stats: &IndexStats) {
    println!("{}", "Certificate Index".bold().underline());
    println!("  {} {}", "Total:".bold(), stats.total.to_string().cyan());
    println!("  {} {}", "Valid:".bold(), stats.valid.to_string().green());
    println!(
        "  {} {}",
        "Expiring soon:".bold(),
        stats.expiring_soon.to_string().yellow()
    );
    println!("  {} {}", "Expired:".bold(), stats.expired.to_string().red());

    if stats.issuers.is_empty() {
        return;
    }

    println!();
    let rows: Vec<IssuerRow> = stats
        .issuers
        .iter()
        .map(|i| IssuerRow {
            issuer: truncate(i.name.as_deref().unwrap_or("(no CN)"), 48),
            count: i.count,
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));

    if stats.attention() > 0 {
        println!();
        println!(
            "{}",
            format!(
                "{} certificates need attention. Tip: certwatch list --status expiring_soon",
                stats.attention()
            )
            .dimmed()
        );
    }
}
