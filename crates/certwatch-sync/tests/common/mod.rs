//! Shared fixtures for certwatch-sync integration tests.

#![allow(dead_code)]

use certwatch_sync::{IndexStore, SyncConfig, SyncEngine};
use flate2::write::GzEncoder;
use flate2::Compression;
use rcgen::{date_time_ymd, CertificateParams, DistinguishedName, DnType, KeyPair, SanType};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Self-signed certificate DER for `cn`, valid until 2030-01-01.
pub fn cert_der(cn: &str) -> Vec<u8> {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
    params.not_before = date_time_ymd(2024, 1, 1);
    params.not_after = date_time_ymd(2030, 1, 1);
    params.subject_alt_names = vec![SanType::DnsName(cn.try_into().unwrap())];

    let key = KeyPair::generate().unwrap();
    params.self_signed(&key).unwrap().der().to_vec()
}

/// Write `<dir>/<name>.tar.gz` with the given entries.
pub fn write_archive(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(format!("{name}.tar.gz"));
    let file = File::create(&path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (entry_path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, entry_path, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
    path
}

/// Archive directory, on-disk index and engine wired together.
pub struct Harness {
    pub dir: TempDir,
    pub config: SyncConfig,
    pub index: Arc<IndexStore>,
    pub engine: Arc<SyncEngine>,
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let archives = dir.path().join("archives");
        std::fs::create_dir(&archives).unwrap();
        let config = SyncConfig {
            archive_dir: archives,
            database_path: dir.path().join("index.db"),
            settle_delay_ms: 100,
            ..SyncConfig::default()
        };
        let index = Arc::new(IndexStore::open(&config.database_path).unwrap());
        let engine = Arc::new(SyncEngine::new(Arc::clone(&index), &config));
        Self {
            dir,
            config,
            index,
            engine,
        }
    }

    pub fn archives(&self) -> &Path {
        &self.config.archive_dir
    }
}
