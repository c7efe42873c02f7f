//! Redirect Store tests against a temporary database

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use redb::Database;
use tempfile::NamedTempFile;

use shortlink::database::init_db;
use shortlink::error::StoreError;
use shortlink::store::RedirectStore;

fn setup_store() -> (RedirectStore, NamedTempFile) {
    let (store, _db, temp_db) = setup_store_with_timeout(Duration::from_secs(5));
    (store, temp_db)
}

/// Store plus a direct handle on its database, for holding the writer lock
fn setup_store_with_timeout(timeout: Duration) -> (RedirectStore, Arc<Database>, NamedTempFile) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let db = init_db(temp_db.path().to_str().unwrap()).expect("Failed to initialize test database");
    let db = Arc::new(db);

    (RedirectStore::new(Arc::clone(&db), timeout), db, temp_db)
}

/// Holds redb's single write transaction for `hold` on another thread
///
/// Returns once the transaction is open; join the handle to wait for release.
async fn hold_writer(db: &Arc<Database>, hold: Duration) -> std::thread::JoinHandle<()> {
    let (locked_tx, locked_rx) = tokio::sync::oneshot::channel();
    let db = Arc::clone(db);

    let holder = std::thread::spawn(move || {
        let write_txn = db.begin_write().unwrap();
        locked_tx.send(()).unwrap();
        std::thread::sleep(hold);
        write_txn.abort().unwrap();
    });

    locked_rx.await.unwrap();
    holder
}

/// Waits until the writer lock is free and any queued transaction has run
async fn drain_writer(holder: std::thread::JoinHandle<()>) {
    tokio::task::spawn_blocking(move || holder.join().unwrap())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn create_then_resolve_returns_submitted_url() {
    let (store, _temp_db) = setup_store();

    let id = store.create("abc123", "https://example.com/a").await.unwrap();
    assert_eq!(id, "abc123");

    let url = store.resolve_and_record_visit("abc123").await.unwrap();
    assert_eq!(url, "https://example.com/a");
}

#[tokio::test]
async fn created_link_starts_without_visits() {
    let (store, _temp_db) = setup_store();

    store.create("fresh", "https://example.com/fresh").await.unwrap();

    let link = store.get("fresh").await.unwrap().unwrap();
    assert_eq!(link.short_id, "fresh");
    assert_eq!(link.redirect_url, "https://example.com/fresh");
    assert!(link.visit_history.is_empty());
}

#[tokio::test]
async fn resolving_unknown_id_is_not_found() {
    let (store, _temp_db) = setup_store();

    let err = store.resolve_and_record_visit("missing").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == "missing"));

    assert!(store.get("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_create_is_rejected_and_keeps_original() {
    let (store, _temp_db) = setup_store();

    store.create("dup", "https://example.com/first").await.unwrap();
    store.resolve_and_record_visit("dup").await.unwrap();

    let err = store.create("dup", "https://example.com/second").await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(id) if id == "dup"));

    let link = store.get("dup").await.unwrap().unwrap();
    assert_eq!(link.redirect_url, "https://example.com/first");
    assert_eq!(link.visit_history.len(), 1);
}

#[tokio::test]
async fn each_resolution_appends_exactly_one_visit() {
    let (store, _temp_db) = setup_store();
    store.create("twice", "https://example.com/twice").await.unwrap();

    for expected in 1..=2 {
        let url = store.resolve_and_record_visit("twice").await.unwrap();
        assert_eq!(url, "https://example.com/twice");

        let link = store.get("twice").await.unwrap().unwrap();
        assert_eq!(link.redirect_url, "https://example.com/twice");
        assert_eq!(link.visit_history.len(), expected);
    }
}

#[tokio::test]
async fn visit_timestamps_are_taken_at_resolution() {
    let (store, _temp_db) = setup_store();
    store.create("timed", "https://example.com/timed").await.unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    let before = Utc::now();
    store.resolve_and_record_visit("timed").await.unwrap();
    store.resolve_and_record_visit("timed").await.unwrap();
    let after = Utc::now();

    let history = store.get("timed").await.unwrap().unwrap().visit_history;
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|visit| visit.timestamp >= before && visit.timestamp <= after));
    assert!(history[0].timestamp <= history[1].timestamp);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resolutions_lose_no_visits() {
    let (store, _temp_db) = setup_store();
    store.create("hot", "https://example.com/hot").await.unwrap();

    const VISITS: usize = 50;
    let tasks: Vec<_> = (0..VISITS)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.resolve_and_record_visit("hot").await })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), "https://example.com/hot");
    }

    let link = store.get("hot").await.unwrap().unwrap();
    assert_eq!(link.visit_history.len(), VISITS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resolutions_on_different_ids_are_independent() {
    let (store, _temp_db) = setup_store();
    store.create("left", "https://example.com/left").await.unwrap();
    store.create("right", "https://example.com/right").await.unwrap();

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let store = store.clone();
            let id = if i % 2 == 0 { "left" } else { "right" };
            tokio::spawn(async move { store.resolve_and_record_visit(id).await })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(store.get("left").await.unwrap().unwrap().visit_history.len(), 10);
    assert_eq!(store.get("right").await.unwrap().unwrap().visit_history.len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resolution_times_out_behind_a_busy_writer() {
    let (store, db, _temp_db) = setup_store_with_timeout(Duration::from_millis(50));
    let patient = RedirectStore::new(Arc::clone(&db), Duration::from_secs(5));
    patient.create("k", "https://example.com/k").await.unwrap();

    let holder = hold_writer(&db, Duration::from_millis(300)).await;

    let err = store.resolve_and_record_visit("k").await.unwrap_err();
    assert!(matches!(err, StoreError::Timeout(timeout) if timeout == Duration::from_millis(50)));

    drain_writer(holder).await;

    // No redirect was issued, so no visit may have been recorded
    let link = patient.get("k").await.unwrap().unwrap();
    assert!(link.visit_history.is_empty());

    assert_eq!(
        patient.resolve_and_record_visit("k").await.unwrap(),
        "https://example.com/k"
    );
    assert_eq!(patient.get("k").await.unwrap().unwrap().visit_history.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timed_out_create_leaves_no_link() {
    let (store, db, _temp_db) = setup_store_with_timeout(Duration::from_millis(50));
    let patient = RedirectStore::new(Arc::clone(&db), Duration::from_secs(5));

    let holder = hold_writer(&db, Duration::from_millis(300)).await;

    let err = store.create("late", "https://example.com/late").await.unwrap_err();
    assert!(matches!(err, StoreError::Timeout(_)));

    drain_writer(holder).await;

    assert!(patient.get("late").await.unwrap().is_none());
    assert_eq!(
        patient.create("late", "https://example.com/late").await.unwrap(),
        "late"
    );
}
