use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::archive::ArchiveName;
use super::status::CertStatus;

/// One parsed certificate belonging to exactly one archive.
///
/// Records are replaced as whole sets per archive, never edited field by
/// field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Owning archive
    pub archive_name: ArchiveName,
    /// Path of the certificate entry inside the archive
    pub entry_path: String,
    /// Subject common name, if the subject carries one
    pub subject_cn: Option<String>,
    /// Full subject distinguished name
    pub subject_dn: String,
    /// Issuer common name, if the issuer carries one
    pub issuer_cn: Option<String>,
    /// Full issuer distinguished name
    pub issuer_dn: String,
    /// Start of the validity window (UTC)
    pub not_before: DateTime<Utc>,
    /// End of the validity window (UTC)
    pub not_after: DateTime<Utc>,
    /// Whole days until `not_after`, floored; negative once expired
    pub days_to_expiry: i64,
    /// Derived from `days_to_expiry` and the threshold at sync time
    pub status: CertStatus,
    /// SHA-256 over the DER encoding (lowercase hex)
    pub fingerprint_sha256: String,
    /// SHA-1 over the DER encoding (lowercase hex)
    pub fingerprint_sha1: String,
    /// Signature algorithm label such as `RSA-SHA256`
    pub signature_algorithm: String,
    /// Public key size in bits, when known
    pub key_bits: Option<u32>,
    /// DNS names and IP addresses from the SAN extension, in order
    pub sans: Vec<String>,
    /// Size of the certificate entry in bytes
    pub file_size: u64,
    /// When the owning archive was last synchronized
    pub synced_at: DateTime<Utc>,
    /// Liveness flag; records in the index are live
    pub is_live: bool,
}

impl CertificateRecord {
    /// Display name: subject CN, falling back to the archive name
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.subject_cn
            .as_deref()
            .unwrap_or_else(|| self.archive_name.as_str())
    }

    /// SANs joined for flat exports
    #[must_use]
    pub fn sans_joined(&self) -> String {
        self.sans.join(", ")
    }
}
