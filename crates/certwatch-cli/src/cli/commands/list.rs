//! `certwatch list` - Paginated certificate listing.

use anyhow::Result;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use certwatch_core::{CertificateQuery, CertificateRecord, Page};

use super::Context;
use crate::cli::args::ListArgs;
use crate::output::{days_label, status_label, truncate, OutputFormat};

#[derive(Tabled)]
struct CertRow {
    #[tabled(rename = "Archive")]
    archive: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Issuer")]
    issuer: String,
    #[tabled(rename = "Not After")]
    not_after: String,
    #[tabled(rename = "Days")]
    days: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl CertRow {
    fn from_record(record: &CertificateRecord) -> Self {
        Self {
            archive: truncate(record.archive_name.as_str(), 24),
            subject: truncate(record.subject_cn.as_deref().unwrap_or("-"), 32),
            issuer: truncate(record.issuer_cn.as_deref().unwrap_or("-"), 28),
            not_after: record.not_after.format("%Y-%m-%d").to_string(),
            days: days_label(record.days_to_expiry, record.status).to_string(),
            status: status_label(record.status).to_string(),
        }
    }
}

/// Render records as a rounded table.
fn render_table(records: &[CertificateRecord]) -> String {
    let rows: Vec<CertRow> = records.iter().map(CertRow::from_record).collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}

pub async fn execute(ctx: Context, args: ListArgs) -> Result<()> {
    let query = CertificateQuery {
        page: args.page,
        size: args.size,
        search: args.search,
        status: args.status,
        issuer: args.issuer,
        sort: args.sort,
        order: args.order,
    };
    query.validate()?;

    let page = ctx.with_index(move |index| index.list(&query)).await?;

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        OutputFormat::Pretty => print_page(&page),
    }

    Ok(())
}

fn print_page(page: &Page<CertificateRecord>) {
    if page.items.is_empty() {
        println!("{}", "No certificates match.".dimmed());
        if page.total > 0 {
            println!(
                "{}",
                format!("Page {} is past the last page ({}).", page.page, page.pages).dimmed()
            );
        }
        return;
    }

    println!("{}", render_table(&page.items));
    println!(
        "{}",
        format!(
            "Page {} of {} ({} certificates)",
            page.page, page.pages, page.total
        )
        .dimmed()
    );
    if u64::from(page.page) < page.pages {
        println!(
            "{}",
            format!("Tip: Use --page {} to see more", page.page + 1).dimmed()
        );
    }
}
