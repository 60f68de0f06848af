//! Domain types shared across the workspace.

mod archive;
mod query;
mod record;
mod stats;
mod status;

pub use archive::{is_archive_path, ArchiveName, ARCHIVE_SUFFIX};
pub use query::{CertificateQuery, Page, SortField, SortOrder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use record::CertificateRecord;
pub use stats::{IndexStats, IssuerCount};
pub use status::CertStatus;
