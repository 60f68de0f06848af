//! # certwatch-cli
//!
//! Command-line interface for the certwatch certificate index.
//!
//! ## Features
//!
//! - **Service**: `run` watches the archive directory and rescans on a timer
//!   (SIGHUP forces a rescan)
//! - **One-shot sync**: `rescan` resynchronizes every archive and exits
//! - **Queries**: `list`, `show` and `stats` over the index
//! - **Export**: CSV or JSON dumps, optionally filtered by status
//! - **Fetch**: copy a raw archive out of the archive directory

pub mod cli;
pub mod logging;
pub mod output;

pub use cli::run;
