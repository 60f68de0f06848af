use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while validating domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Archive name is empty or could escape the archive directory
    #[error("invalid archive name: {name:?}")]
    InvalidArchiveName {
        /// The rejected name
        name: String,
    },

    /// File name does not carry the archive suffix
    #[error("not an archive file: {0}")]
    NotAnArchive(String),

    /// Status label outside `valid | expiring_soon | expired`
    #[error("unknown certificate status: {0}")]
    UnknownStatus(String),

    /// Sort key outside the allowlist
    #[error("unknown sort field: {field} (allowed: {allowed})")]
    UnknownSortField {
        /// The rejected key
        field: String,
        /// Comma-separated allowlist, for the error message
        allowed: String,
    },

    /// Sort direction other than asc/desc
    #[error("unknown sort order: {0} (allowed: asc, desc)")]
    UnknownSortOrder(String),

    /// Page or page size out of range
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),
}

impl CoreError {
    /// Returns true if the error was caused by caller input
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArchiveName { .. }
                | Self::UnknownStatus(_)
                | Self::UnknownSortField { .. }
                | Self::UnknownSortOrder(_)
                | Self::InvalidPagination(_)
        )
    }
}
