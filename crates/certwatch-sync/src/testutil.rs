//! Certificate and archive fixtures for unit tests.

use certwatch_core::{ArchiveName, CertStatus, CertificateRecord};
use chrono::{DateTime, Duration, TimeZone, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use rcgen::{date_time_ymd, CertificateParams, DistinguishedName, DnType, KeyPair, SanType};
use std::fs::File;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// A freshly generated self-signed certificate in both encodings.
pub struct TestCert {
    pub der: Vec<u8>,
    pub pem: String,
}

/// Self-signed P-256 certificate valid 2024-01-01 .. `not_after` (midnight UTC).
pub fn cert(cn: Option<&str>, sans: &[&str], not_after: (i32, u8, u8)) -> TestCert {
    let mut params = CertificateParams::default();

    let mut dn = DistinguishedName::new();
    if let Some(cn) = cn {
        dn.push(DnType::CommonName, cn);
    }
    dn.push(DnType::OrganizationName, "Certwatch Test");
    params.distinguished_name = dn;

    params.not_before = date_time_ymd(2024, 1, 1);
    params.not_after = date_time_ymd(not_after.0, not_after.1, not_after.2);
    params.subject_alt_names = sans
        .iter()
        .map(|s| match s.parse::<IpAddr>() {
            Ok(ip) => SanType::IpAddress(ip),
            Err(_) => SanType::DnsName((*s).try_into().unwrap()),
        })
        .collect();

    let key = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();
    TestCert {
        der: cert.der().to_vec(),
        pem: cert.pem(),
    }
}

/// Certificate for `cn` expiring 2030-01-01.
pub fn simple_cert(cn: &str) -> TestCert {
    cert(Some(cn), &[cn], (2030, 1, 1))
}

/// Fixed evaluation time: 2029-12-02, exactly 30 days before 2030-01-01.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2029, 12, 2, 0, 0, 0).unwrap()
}

/// Write `<dir>/<name>.tar.gz` containing `entries` as regular files.
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

/// Hand-built record for index tests; fingerprints derive from `days`.
pub fn record(archive: &str, entry: &str, cn: &str, days: i64) -> CertificateRecord {
    let now = fixed_now();
    CertificateRecord {
        archive_name: ArchiveName::parse(archive).unwrap(),
        entry_path: entry.to_string(),
        subject_cn: Some(cn.to_string()),
        subject_dn: format!("CN={cn}"),
        issuer_cn: Some("Test CA".to_string()),
        issuer_dn: "CN=Test CA".to_string(),
        not_before: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        not_after: now + Duration::days(days),
        days_to_expiry: days,
        status: CertStatus::classify(days, 30),
        fingerprint_sha256: format!("{:064x}", days.unsigned_abs()),
        fingerprint_sha1: format!("{:040x}", days.unsigned_abs()),
        signature_algorithm: "ECDSA-SHA256".to_string(),
        key_bits: Some(256),
        sans: vec![cn.to_string(), "10.0.0.1".to_string()],
        file_size: 512,
        synced_at: now,
        is_live: true,
    }
}

/// Create a named pipe at `path`. Opening it for reading blocks until a
/// writer shows up.
#[cfg(unix)]
pub fn make_fifo(path: &Path) {
    let status = std::process::Command::new("mkfifo").arg(path).status().unwrap();
    assert!(status.success(), "mkfifo failed for {}", path.display());
}

/// Open `fifo` for writing, push `bytes` through it and close it.
#[cfg(unix)]
pub fn feed_fifo(fifo: &Path, bytes: &[u8]) {
    use std::io::Write;
    let mut writer = std::fs::OpenOptions::new().write(true).open(fifo).unwrap();
    writer.write_all(bytes).unwrap();
}
