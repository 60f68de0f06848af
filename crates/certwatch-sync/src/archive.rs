//! Streaming reader for `.tar.gz` certificate archives.

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

use certwatch_core::{ArchiveName, CertificateRecord};

use crate::error::{Result, SyncError};
use crate::extract::Extractor;

/// Entries larger than this are skipped without being read.
pub const MAX_CERT_BYTES: u64 = 1024 * 1024;

const CERT_DIR_MARKER: &str = "certs/";
const CERT_SUFFIX: &str = ".crt";

/// Records extracted from one archive.
#[derive(Debug, Clone)]
pub struct ParsedArchive {
    pub name: ArchiveName,
    pub records: Vec<CertificateRecord>,
    /// Certificate entries that were present but could not be used
    pub skipped: usize,
}

/// Returns true for entry paths that hold a certificate.
#[must_use]
pub fn is_certificate_entry(entry_path: &str) -> bool {
    entry_path.contains(CERT_DIR_MARKER) && entry_path.ends_with(CERT_SUFFIX)
}

/// Reads certificate entries out of an archive file.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveParser {
    extractor: Extractor,
}

impl ArchiveParser {
    #[must_use]
    pub const fn new(threshold_days: u32) -> Self {
        Self {
            extractor: Extractor::new(threshold_days),
        }
    }

    /// Parse every certificate entry in the archive at `path`.
    ///
    /// Unusable entries are logged and counted in [`ParsedArchive::skipped`].
    /// If the archive itself cannot be opened or streamed, an
    /// [`SyncError::ArchiveOpen`] is returned and nothing should be written
    /// to the index.
    pub fn parse(&self, path: &Path, now: DateTime<Utc>) -> Result<ParsedArchive> {
        let name = ArchiveName::from_path(path)?;
        let path_str = path.display().to_string();

        let file = File::open(path).map_err(|e| SyncError::archive_open(&path_str, e))?;
        let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
        let entries = archive
            .entries()
            .map_err(|e| SyncError::archive_open(&path_str, e))?;

        // One slot per entry path; a later member with the same path
        // replaces the earlier one, as tar extraction would.
        let mut slots: Vec<Option<CertificateRecord>> = Vec::new();
        let mut slot_of: HashMap<String, usize> = HashMap::new();
        let mut skipped = 0;

        for entry in entries {
            let mut entry = entry.map_err(|e| SyncError::archive_open(&path_str, e))?;
            if !entry.header().entry_type().is_file() {
                continue;
            }

            let entry_path = match entry.path() {
                Ok(p) => p.to_string_lossy().into_owned(),
                Err(e) => {
                    warn!(archive = %name, error = %e, "unreadable entry path, skipping");
                    skipped += 1;
                    continue;
                }
            };
            if !is_certificate_entry(&entry_path) {
                continue;
            }

            let size = entry.size();
            let parsed = if size > MAX_CERT_BYTES {
                warn!(archive = %name, entry = %entry_path, size, "certificate entry too large, skipping");
                skipped += 1;
                None
            } else {
                let mut bytes = Vec::with_capacity(usize::try_from(size).unwrap_or_default());
                entry
                    .read_to_end(&mut bytes)
                    .map_err(|e| SyncError::archive_open(&path_str, e))?;

                match self.extractor.extract(&bytes, &entry_path, now) {
                    Ok(cert) => {
                        let file_size = bytes.len() as u64;
                        Some(cert.into_record(name.clone(), entry_path.clone(), file_size, now))
                    }
                    Err(e) => {
                        warn!(archive = %name, entry = %entry_path, error = %e, "skipping unparseable certificate");
                        skipped += 1;
                        None
                    }
                }
            };

            if let Some(&slot) = slot_of.get(&entry_path) {
                debug!(archive = %name, entry = %entry_path, "duplicate entry path, later member wins");
                slots[slot] = parsed;
            } else {
                slot_of.insert(entry_path, slots.len());
                slots.push(parsed);
            }
        }

        let records: Vec<CertificateRecord> = slots.into_iter().flatten().collect();
        debug!(archive = %name, records = records.len(), skipped, "archive parsed");
        Ok(ParsedArchive {
            name,
            records,
            skipped,
        })
    }
}
