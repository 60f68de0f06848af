use serde::{Deserialize, Serialize};

use super::status::CertStatus;
use crate::error::{CoreError, Result};

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Fields a listing may be sorted by.
///
/// This is a closed allowlist; anything else is rejected rather than
/// silently replaced by a default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Archive name
    ArchiveName,
    /// Subject common name
    SubjectCn,
    /// Issuer common name
    Issuer,
    /// Start of validity
    NotBefore,
    /// End of validity
    #[default]
    NotAfter,
    /// Days until expiry
    DaysToExpiry,
    /// Status label
    Status,
    /// Public key size
    KeyBits,
    /// Entry size
    FileSize,
    /// Last synchronization time
    SyncedAt,
}

impl SortField {
    /// Every accepted sort field.
    pub const ALL: [Self; 10] = [
        Self::ArchiveName,
        Self::SubjectCn,
        Self::Issuer,
        Self::NotBefore,
        Self::NotAfter,
        Self::DaysToExpiry,
        Self::Status,
        Self::KeyBits,
        Self::FileSize,
        Self::SyncedAt,
    ];

    /// External key, as accepted by [`std::str::FromStr`]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ArchiveName => "archive_name",
            Self::SubjectCn => "subject_cn",
            Self::Issuer => "issuer",
            Self::NotBefore => "not_before",
            Self::NotAfter => "not_after",
            Self::DaysToExpiry => "days_to_expiry",
            Self::Status => "status",
            Self::KeyBits => "key_bits",
            Self::FileSize => "file_size",
            Self::SyncedAt => "synced_at",
        }
    }

    fn allowed() -> String {
        Self::ALL
            .iter()
            .map(Self::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| CoreError::UnknownSortField {
                field: s.to_string(),
                allowed: Self::allowed(),
            })
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl SortOrder {
    /// SQL keyword for this direction
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(CoreError::UnknownSortOrder(s.to_string())),
        }
    }
}

/// Listing request over the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateQuery {
    /// 1-based page number
    pub page: u32,
    /// Records per page, `1..=MAX_PAGE_SIZE`
    pub size: u32,
    /// Case-insensitive substring over archive name, subject CN and issuer CN
    pub search: Option<String>,
    /// Exact status filter
    pub status: Option<CertStatus>,
    /// Case-insensitive substring over issuer CN
    pub issuer: Option<String>,
    /// Sort key
    pub sort: SortField,
    /// Sort direction
    pub order: SortOrder,
}

impl Default for CertificateQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            search: None,
            status: None,
            issuer: None,
            sort: SortField::default(),
            order: SortOrder::default(),
        }
    }
}

impl CertificateQuery {
    /// Reject out-of-range pagination.
    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(CoreError::InvalidPagination("page starts at 1".into()));
        }
        if self.size == 0 || self.size > MAX_PAGE_SIZE {
            return Err(CoreError::InvalidPagination(format!(
                "size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.size
            )));
        }
        Ok(())
    }

    /// Rows to skip for the requested page
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.size as u64
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records on this page
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u32,
    /// Requested page size
    pub size: u32,
    /// Matching records across all pages
    pub total: u64,
    /// Number of pages
    pub pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page, deriving the page count.
    #[must_use]
    pub fn new(items: Vec<T>, page: u32, size: u32, total: u64) -> Self {
        let pages = if size == 0 {
            0
        } else {
            total.div_ceil(u64::from(size))
        };
        Self {
            items,
            page,
            size,
            total,
            pages,
        }
    }
}
