//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use certwatch_core::{CertStatus, SortField, SortOrder, DEFAULT_PAGE_SIZE};

use crate::logging::LogFormat;
use crate::output::{ExportFormat, OutputFormat};

/// Certificate archive index
///
/// Watches a directory of `<name>.tar.gz` archives, keeps a SQLite index of
/// every certificate under `certs/*.crt` inside them, and reports on expiry.
#[derive(Parser, Debug)]
#[command(name = "certwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format for list, show, stats and rescan
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Log filter (e.g. info, debug, certwatch_sync=trace)
    #[arg(long, env = "CERTWATCH_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// TOML config file (missing file means defaults)
    #[arg(short, long, env = "CERTWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the archives
    #[arg(long, global = true)]
    pub archive_dir: Option<PathBuf>,

    /// SQLite index file
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Days before expiry at which a certificate counts as expiring soon
    #[arg(long, global = true)]
    pub threshold_days: Option<u32>,

    /// Seconds between full rescans
    #[arg(long, global = true)]
    pub scan_interval: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the archive directory and keep the index current until Ctrl-C
    Run,

    /// Resynchronize every archive once and exit
    Rescan,

    /// List indexed certificates
    List(ListArgs),

    /// Show every certificate of one archive
    Show(ShowArgs),

    /// Counts by status and issuer
    Stats,

    /// Export certificates as CSV or JSON
    Export(ExportArgs),

    /// Copy a raw archive out of the archive directory
    Fetch(FetchArgs),
}

// ============================================================================
// List command
// ============================================================================

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Page number (1-indexed)
    #[arg(short, long, default_value = "1")]
    pub page: u32,

    /// Results per page (1-100)
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub size: u32,

    /// Substring match on archive name, subject CN or issuer CN
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only certificates with this status (valid, expiring_soon, expired)
    #[arg(long)]
    pub status: Option<CertStatus>,

    /// Substring match on issuer CN
    #[arg(long)]
    pub issuer: Option<String>,

    /// Sort key
    #[arg(long, default_value = "not_after")]
    pub sort: SortField,

    /// Sort direction (asc or desc)
    #[arg(long, default_value = "asc")]
    pub order: SortOrder,
}

// ============================================================================
// Show command
// ============================================================================

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Archive name (file name without .tar.gz)
    pub archive: String,
}

// ============================================================================
// Export command
// ============================================================================

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Only certificates with this status
    #[arg(long)]
    pub status: Option<CertStatus>,

    /// Write to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

// ============================================================================
// Fetch command
// ============================================================================

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Archive name (file name without .tar.gz)
    pub archive: String,

    /// Destination directory
    #[arg(short, long, default_value = ".")]
    pub dest: PathBuf,
}
