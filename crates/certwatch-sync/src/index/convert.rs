use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

use certwatch_core::{ArchiveName, CertStatus, CertificateRecord};

/// Column list matching [`row_to_record`].
pub const RECORD_COLUMNS: &str = "archive_name, entry_path, subject_cn, subject_dn, issuer_cn, \
     issuer_dn, not_before, not_after, days_to_expiry, status, fingerprint_sha256, \
     fingerprint_sha1, signature_algorithm, key_bits, sans, file_size, synced_at, is_live";

/// Convert a database row to a [`CertificateRecord`]
pub fn row_to_record(row: &Row<'_>) -> rusqlite::Result<CertificateRecord> {
    let archive_name: String = row.get(0)?;
    let status: String = row.get(9)?;
    let key_bits: Option<i64> = row.get(13)?;
    let sans: String = row.get(14)?;
    let file_size: i64 = row.get(15)?;

    Ok(CertificateRecord {
        archive_name: ArchiveName::parse(archive_name)
            .map_err(|e| conversion_error(0, Type::Text, e))?,
        entry_path: row.get(1)?,
        subject_cn: row.get(2)?,
        subject_dn: row.get(3)?,
        issuer_cn: row.get(4)?,
        issuer_dn: row.get(5)?,
        not_before: from_unix(6, row.get(6)?)?,
        not_after: from_unix(7, row.get(7)?)?,
        days_to_expiry: row.get(8)?,
        status: status
            .parse::<CertStatus>()
            .map_err(|e| conversion_error(9, Type::Text, e))?,
        fingerprint_sha256: row.get(10)?,
        fingerprint_sha1: row.get(11)?,
        signature_algorithm: row.get(12)?,
        key_bits: key_bits.and_then(|b| u32::try_from(b).ok()),
        sans: serde_json::from_str(&sans).map_err(|e| conversion_error(14, Type::Text, e))?,
        file_size: u64::try_from(file_size).unwrap_or_default(),
        synced_at: from_unix(16, row.get(16)?)?,
        is_live: row.get(17)?,
    })
}

fn from_unix(idx: usize, secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single().ok_or_else(|| {
        rusqlite::Error::IntegralValueOutOfRange(idx, secs)
    })
}

fn conversion_error<E>(idx: usize, ty: Type, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(e))
}
