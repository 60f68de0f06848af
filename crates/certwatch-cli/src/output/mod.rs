//! Output formatting for different formats.

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

use certwatch_core::CertStatus;

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed tables with colors
    #[default]
    Pretty,
    /// JSON output
    Json,
}

/// Formats accepted by `certwatch export`.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values with a header row
    #[default]
    Csv,
    /// JSON array of records
    Json,
}

/// Status label colored by severity.
pub fn status_label(status: CertStatus) -> ColoredString {
    match status {
        CertStatus::Valid => status.as_str().green(),
        CertStatus::ExpiringSoon => status.as_str().yellow().bold(),
        CertStatus::Expired => status.as_str().red().bold(),
    }
}

/// Days-to-expiry colored the same way as the status it produced.
pub fn days_label(days: i64, status: CertStatus) -> ColoredString {
    let text = days.to_string();
    match status {
        CertStatus::Valid => text.normal(),
        CertStatus::ExpiringSoon => text.yellow(),
        CertStatus::Expired => text.red(),
    }
}

/// Truncate to `max` characters for table cells.
pub fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
