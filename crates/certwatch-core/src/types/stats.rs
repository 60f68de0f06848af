use serde::{Deserialize, Serialize};

/// Aggregate counts over the live index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// All live records
    pub total: u64,
    /// Records with status `valid`
    pub valid: u64,
    /// Records with status `expiring_soon`
    pub expiring_soon: u64,
    /// Records with status `expired`
    pub expired: u64,
    /// Record counts per issuer, largest first
    pub issuers: Vec<IssuerCount>,
}

/// Number of records sharing one issuer common name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerCount {
    /// Issuer CN; `None` for issuers without one
    pub name: Option<String>,
    /// Number of records
    pub count: u64,
}

impl IndexStats {
    /// Records that need attention (expiring soon or expired)
    #[must_use]
    pub const fn attention(&self) -> u64 {
        self.expiring_soon + self.expired
    }
}
