//! End-to-end behavior of archive synchronization against a real directory
//! and SQLite file.

mod common;

use certwatch_core::{ArchiveName, CertStatus, CertificateQuery};
use certwatch_sync::{CertWatchService, SyncError};
use common::{cert_der, write_archive, Harness};
use std::sync::Arc;
use std::time::Duration;

fn name(s: &str) -> ArchiveName {
    ArchiveName::parse(s).unwrap()
}

#[tokio::test]
async fn resync_of_unchanged_archive_is_idempotent() {
    let h = Harness::new();
    let a = cert_der("a.example.com");
    let b = cert_der("b.example.com");
    let path = write_archive(h.archives(), "web", &[("certs/a.crt", &a), ("certs/b.crt", &b)]);

    h.engine.sync_archive(&path).await.unwrap();
    let first = h.index.archive(&name("web")).unwrap();
    h.engine.sync_archive(&path).await.unwrap();
    let second = h.index.archive(&name("web")).unwrap();

    assert_eq!(first.len(), 2);
    // synced_at moves with the clock; everything else must match exactly.
    let strip = |records: Vec<certwatch_core::CertificateRecord>| {
        records
            .into_iter()
            .map(|mut r| {
                r.synced_at = chrono::DateTime::from_timestamp(0, 0).unwrap();
                r
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(strip(first), strip(second));
}

#[tokio::test]
async fn failed_rewrite_preserves_previous_set() {
    let h = Harness::new();
    let a = cert_der("a.example.com");
    let path = write_archive(h.archives(), "web", &[("certs/a.crt", &a)]);
    h.engine.sync_archive(&path).await.unwrap();
    let before = h.index.archive(&name("web")).unwrap();

    // A second connection installs a trigger that aborts one insert midway.
    let side = rusqlite::Connection::open(&h.config.database_path).unwrap();
    side.execute_batch(
        "CREATE TRIGGER fail_insert BEFORE INSERT ON certificates
         WHEN NEW.entry_path = 'certs/z.crt'
         BEGIN SELECT RAISE(ABORT, 'insert rejected'); END;",
    )
    .unwrap();
    drop(side);

    let mut rewritten = before.clone();
    let mut failing = before[0].clone();
    failing.entry_path = "certs/z.crt".to_string();
    rewritten.push(failing);
    let err = h.index.reconcile(&name("web"), &rewritten).unwrap_err();
    assert!(matches!(err, SyncError::Index(_)));

    assert_eq!(h.index.archive(&name("web")).unwrap(), before);
}

#[tokio::test]
async fn corrupt_archive_leaves_index_untouched() {
    let h = Harness::new();
    let a = cert_der("a.example.com");
    let path = write_archive(h.archives(), "web", &[("certs/a.crt", &a)]);
    h.engine.sync_archive(&path).await.unwrap();

    std::fs::write(&path, b"not a gzip stream").unwrap();
    assert!(h.engine.sync_archive(&path).await.is_err());
    assert_eq!(h.index.archive(&name("web")).unwrap().len(), 1);
}

#[tokio::test]
async fn garbage_entry_is_skipped_alongside_good_one() {
    let h = Harness::new();
    let good = cert_der("good.example.com");
    let truncated = &good[..good.len() / 3];
    let path = write_archive(
        h.archives(),
        "mixed",
        &[("certs/good.crt", &good), ("certs/bad.crt", truncated)],
    );

    let outcome = h.engine.sync_archive(&path).await.unwrap();
    assert_eq!(outcome.stored, 1);
    assert_eq!(outcome.skipped, 1);
    let records = h.index.archive(&name("mixed")).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].subject_cn.as_deref(), Some("good.example.com"));
}

#[tokio::test]
async fn repeated_member_path_syncs_with_last_copy() {
    let h = Harness::new();
    let old = cert_der("old.example.com");
    let new = cert_der("new.example.com");
    let path = write_archive(
        h.archives(),
        "web",
        &[("certs/a.crt", &old), ("certs/a.crt", &new)],
    );

    let outcome = h.engine.sync_archive(&path).await.unwrap();
    assert_eq!(outcome.stored, 1);
    let records = h.index.archive(&name("web")).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].entry_path, "certs/a.crt");
    assert_eq!(records[0].subject_cn.as_deref(), Some("new.example.com"));
}

#[tokio::test]
async fn archive_name_with_inner_dots_is_indexed() {
    let h = Harness::new();
    let a = cert_der("a.example.com");
    write_archive(h.archives(), "release..final", &[("certs/a.crt", &a)]);

    let summary = h.engine.rescan_all().await.unwrap();
    assert_eq!(summary.synced, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(h.index.archive(&name("release..final")).unwrap().len(), 1);
}

#[tokio::test]
async fn remove_only_touches_named_archive() {
    let h = Harness::new();
    let a = cert_der("a.example.com");
    let b = cert_der("b.example.com");
    let web = write_archive(h.archives(), "web", &[("certs/a.crt", &a)]);
    let api = write_archive(h.archives(), "api", &[("certs/b.crt", &b)]);
    h.engine.sync_archive(&web).await.unwrap();
    h.engine.sync_archive(&api).await.unwrap();
    let api_before = h.index.archive(&name("api")).unwrap();

    assert_eq!(h.engine.remove_archive(&name("web")).await.unwrap(), 1);
    assert!(h.index.archive(&name("web")).unwrap().is_empty());
    assert_eq!(h.index.archive(&name("api")).unwrap(), api_before);
}

#[tokio::test]
async fn concurrent_watcher_and_rescan_do_not_double_count() {
    let h = Harness::new();
    let a = cert_der("a.example.com");
    let b = cert_der("b.example.com");
    let path = write_archive(h.archives(), "web", &[("certs/a.crt", &a), ("certs/b.crt", &b)]);

    let event_sync = {
        let engine = Arc::clone(&h.engine);
        let path = path.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            engine.sync_archive(&path).await
        })
    };
    let rescan = {
        let engine = Arc::clone(&h.engine);
        tokio::spawn(async move { engine.rescan_all().await })
    };

    event_sync.await.unwrap().unwrap();
    rescan.await.unwrap().unwrap();

    assert_eq!(h.index.archive(&name("web")).unwrap().len(), 2);
    assert_eq!(h.index.stats().unwrap().total, 2);
}

#[tokio::test]
async fn status_is_derived_from_threshold() {
    let h = Harness::new();
    let a = cert_der("a.example.com");
    let path = write_archive(h.archives(), "web", &[("certs/a.crt", &a)]);
    h.engine.sync_archive(&path).await.unwrap();

    let record = &h.index.archive(&name("web")).unwrap()[0];
    assert_eq!(
        record.status,
        CertStatus::classify(record.days_to_expiry, h.config.threshold_days)
    );
}

#[tokio::test]
async fn service_follows_directory_changes() {
    let h = Harness::new();
    let service = CertWatchService::start_with_index(h.config.clone(), Arc::clone(&h.index))
        .unwrap();

    let a = cert_der("a.example.com");
    let path = write_archive(h.archives(), "web", &[("certs/a.crt", &a)]);
    assert!(wait_until(|| h.index.archive(&name("web")).unwrap().len() == 1).await);

    std::fs::remove_file(&path).unwrap();
    assert!(wait_until(|| h.index.archive(&name("web")).unwrap().is_empty()).await);

    service.shutdown().await;
}

#[tokio::test]
async fn manual_rescan_recovers_missed_changes() {
    let h = Harness::new();
    let a = cert_der("a.example.com");
    write_archive(h.archives(), "web", &[("certs/a.crt", &a)]);

    let summary = h.engine.rescan_all().await.unwrap();
    assert_eq!(summary.synced, 1);

    let page = h.index.list(&CertificateQuery::default()).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].archive_name.as_str(), "web");
}

async fn wait_until<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
