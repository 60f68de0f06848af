//! `certwatch show` - Every certificate of one archive.

use anyhow::{bail, Result};
use colored::Colorize;

use certwatch_core::{ArchiveName, CertificateRecord};

use super::Context;
use crate::cli::args::ShowArgs;
use crate::output::{days_label, status_label, OutputFormat};

pub async fn execute(ctx: Context, args: ShowArgs) -> Result<()> {
    let name = ArchiveName::parse(args.archive)?;
    let lookup = name.clone();
    let records = ctx.with_index(move |index| index.archive(&lookup)).await?;

    if records.is_empty() {
        bail!("archive not found in index: {name}");
    }

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        OutputFormat::Pretty => {
            println!(
                "{} {} ({} certificates)",
                "Archive".bold(),
                name.as_str().cyan(),
                records.len()
            );
            for record in &records {
                println!();
                print_record(record);
            }
        }
    }

    Ok(())
}

fn print_record(r: &CertificateRecord) {
    println!("{}", r.entry_path.bold().underline());
    println!("  {} {}", "Subject:".bold(), r.subject_dn);
    println!("  {} {}", "Issuer:".bold(), r.issuer_dn);
    println!(
        "  {} {} .. {}",
        "Validity:".bold(),
        r.not_before.format("%Y-%m-%d %H:%M:%S UTC"),
        r.not_after.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  {} {} days ({})",
        "Expires in:".bold(),
        days_label(r.days_to_expiry, r.status),
        status_label(r.status)
    );
    let key = r
        .key_bits
        .map_or_else(|| "unknown size".to_string(), |bits| format!("{bits} bits"));
    println!("  {} {} / {}", "Algorithm:".bold(), r.signature_algorithm, key);
    if !r.sans.is_empty() {
        println!("  {} {}", "SANs:".bold(), r.sans_joined());
    }
    println!("  {} {}", "SHA-256:".bold(), r.fingerprint_sha256.dimmed());
    println!("  {} {}", "SHA-1:".bold(), r.fingerprint_sha1.dimmed());
    println!(
        "  {} {}",
        "Synced:".bold(),
        r.synced_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}
