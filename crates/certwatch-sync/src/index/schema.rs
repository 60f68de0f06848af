use rusqlite::Connection;

use crate::error::Result;

/// Current schema version, recorded in `index_meta`.
pub const SCHEMA_VERSION: u32 = 1;

/// Create all tables and indexes (idempotent).
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO index_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

/// Schema version stored in the database.
pub fn stored_version(conn: &Connection) -> Result<u32> {
    let value: String = conn.query_row(
        "SELECT value FROM index_meta WHERE key = 'schema_version'",
        [],
        |row| row.get(0),
    )?;
    Ok(value.parse().unwrap_or(0))
}

const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS index_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS certificates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    archive_name TEXT NOT NULL,
    entry_path TEXT NOT NULL,
    subject_cn TEXT,
    subject_dn TEXT NOT NULL,
    issuer_cn TEXT,
    issuer_dn TEXT NOT NULL,
    not_before INTEGER NOT NULL,            -- Unix seconds
    not_after INTEGER NOT NULL,             -- Unix seconds
    days_to_expiry INTEGER NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('valid', 'expiring_soon', 'expired')),
    fingerprint_sha256 TEXT NOT NULL,
    fingerprint_sha1 TEXT NOT NULL,
    signature_algorithm TEXT NOT NULL,
    key_bits INTEGER,
    sans TEXT NOT NULL DEFAULT '[]',        -- JSON array
    file_size INTEGER NOT NULL,
    synced_at INTEGER NOT NULL,             -- Unix seconds
    is_live INTEGER NOT NULL DEFAULT 1,
    UNIQUE (archive_name, entry_path)
);

CREATE INDEX IF NOT EXISTS idx_certificates_archive ON certificates(archive_name);
CREATE INDEX IF NOT EXISTS idx_certificates_status ON certificates(status);
CREATE INDEX IF NOT EXISTS idx_certificates_not_after ON certificates(not_after);
CREATE INDEX IF NOT EXISTS idx_certificates_issuer ON certificates(issuer_cn);
";
