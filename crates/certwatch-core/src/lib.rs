//! Core types for the certwatch certificate index.
//!
//! This crate holds the domain vocabulary shared by the sync engine and its
//! consumers:
//!
//! - **Archives**: [`ArchiveName`], the validated identity of a `<name>.tar.gz` file
//! - **Records**: [`CertificateRecord`], one parsed certificate and its derived [`CertStatus`]
//! - **Queries**: [`CertificateQuery`], [`SortField`] allowlist and [`Page`] results
//! - **Errors**: [`CoreError`] for rejected input
//!
//! # Example
//!
//! ```rust
//! use certwatch_core::{ArchiveName, CertStatus};
//!
//! let name = ArchiveName::from_file_name("billing-api.tar.gz").unwrap();
//! assert_eq!(name.as_str(), "billing-api");
//! assert_eq!(CertStatus::classify(30, 30), CertStatus::ExpiringSoon);
//! ```

mod error;
pub mod types;

pub use error::{CoreError, Result};
pub use types::*;
