//! `certwatch export` - Dump the index as CSV or JSON.

use anyhow::{Context as _, Result};
use colored::Colorize;
use std::io::Write;

use certwatch_core::CertificateRecord;

use super::Context;
use crate::cli::args::ExportArgs;
use crate::output::ExportFormat;

const CSV_HEADERS: [&str; 11] = [
    "Archive Name",
    "Subject CN",
    "Issuer",
    "Not Before",
    "Not After",
    "Days to Expiry",
    "Status",
    "Fingerprint SHA256",
    "Algorithm",
    "Key Length",
    "Domains",
];

pub async fn execute(ctx: Context, args: ExportArgs) -> Result<()> {
    let status = args.status;
    let records = ctx.with_index(move |index| index.export(status)).await?;

    let out: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };

    match args.format {
        ExportFormat::Csv => write_csv(out, &records)?,
        ExportFormat::Json => write_json(out, &records)?,
    }

    if let Some(path) = &args.out {
        eprintln!(
            "{} {} certificates to {}",
            "Exported".green(),
            records.len(),
            path.display()
        );
    }
    Ok(())
}

fn write_csv<W: Write>(out: W, records: &[CertificateRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADERS)?;
    for r in records {
        writer.write_record([
            r.archive_name.as_str().to_string(),
            r.subject_cn.clone().unwrap_or_default(),
            r.issuer_cn.clone().unwrap_or_default(),
            r.not_before.to_rfc3339(),
            r.not_after.to_rfc3339(),
            r.days_to_expiry.to_string(),
            r.status.as_str().to_string(),
            r.fingerprint_sha256.clone(),
            r.signature_algorithm.clone(),
            r.key_bits.map(|b| b.to_string()).unwrap_or_default(),
            r.sans_joined(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json<W: Write>(mut out: W, records: &[CertificateRecord]) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, records)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
