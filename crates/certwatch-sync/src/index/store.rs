use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use certwatch_core::{ArchiveName, CertificateRecord};

use super::schema;
use crate::error::{Result, SyncError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of one reconcile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Rows that existed for the archive before
    pub removed: usize,
    /// Rows written
    pub inserted: usize,
}

/// SQLite certificate index.
///
/// The connection sits behind a mutex; callers on the async side go through
/// `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct IndexStore {
    conn: Arc<Mutex<Connection>>,
}

impl IndexStore {
    /// Open (or create) the index at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::io(parent.display().to_string(), e))?;
        }
        let conn = Connection::open(path).map_err(|e| {
            SyncError::IndexUnavailable(format!("failed to open {}: {e}", path.display()))
        })?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    /// Create an in-memory index (for testing)
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        schema::create_tables(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(super) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SyncError::IndexUnavailable("connection lock poisoned".into()))
    }

    /// Schema version recorded in the database.
    pub fn schema_version(&self) -> Result<u32> {
        let conn = self.conn()?;
        schema::stored_version(&conn)
    }

    /// Replace the record set of `name` with `records`.
    ///
    /// Delete and insert run in one transaction: on any failure the archive's
    /// previous records stay exactly as they were.
    pub fn reconcile(
        &self,
        name: &ArchiveName,
        records: &[CertificateRecord],
    ) -> Result<ReconcileReport> {
        if let Some(foreign) = records.iter().find(|r| &r.archive_name != name) {
            return Err(SyncError::ArchiveMismatch {
                expected: name.to_string(),
                found: foreign.archive_name.to_string(),
                entry: foreign.entry_path.clone(),
            });
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx.execute(
            "DELETE FROM certificates WHERE archive_name = ?1",
            [name.as_str()],
        )?;
        insert_records(&tx, records)?;

        tx.commit()?;
        debug!(archive = %name, removed, inserted = records.len(), "archive reconciled");
        Ok(ReconcileReport {
            removed,
            inserted: records.len(),
        })
    }

    /// Delete every record of `name`. Returns the number of rows deleted;
    /// removing an unknown archive is not an error.
    pub fn remove(&self, name: &ArchiveName) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute(
            "DELETE FROM certificates WHERE archive_name = ?1",
            [name.as_str()],
        )?;
        tx.commit()?;
        debug!(archive = %name, removed, "archive removed from index");
        Ok(removed)
    }
}

fn insert_records(tx: &Transaction<'_>, records: &[CertificateRecord]) -> Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO certificates (archive_name, entry_path, subject_cn, subject_dn, issuer_cn,
             issuer_dn, not_before, not_after, days_to_expiry, status, fingerprint_sha256,
             fingerprint_sha1, signature_algorithm, key_bits, sans, file_size, synced_at, is_live)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
    )?;

    for record in records {
        stmt.execute(params![
            record.archive_name.as_str(),
            record.entry_path,
            record.subject_cn,
            record.subject_dn,
            record.issuer_cn,
            record.issuer_dn,
            record.not_before.timestamp(),
            record.not_after.timestamp(),
            record.days_to_expiry,
            record.status.as_str(),
            record.fingerprint_sha256,
            record.fingerprint_sha1,
            record.signature_algorithm,
            record.key_bits,
            serde_json::to_string(&record.sans)?,
            i64::try_from(record.file_size).unwrap_or(i64::MAX),
            record.synced_at.timestamp(),
            record.is_live,
        ])?;
    }
    Ok(())
}
