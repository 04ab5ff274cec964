use super::*;
use crate::testing::{FakeColumn, FakeEngine};
use mf_core::TableDescriptionStore;
use mf_meta::MetaDb;

fn engine() -> FakeEngine {
    FakeEngine::new()
        .table("customers", vec![FakeColumn::new("id", "INTEGER")])
        .table("orders", vec![FakeColumn::new("id", "INTEGER")])
        .view("open_orders")
}

fn names(keys: &[TableKey]) -> Vec<&str> {
    keys.iter().map(|k| k.table_name.as_str()).collect()
}

fn status(db: &MetaDb, table: &str) -> SyncStatus {
    db.get_description(&TableKey::new("warehouse", "main", table))
        .unwrap()
        .unwrap()
        .sync_status
}

#[tokio::test]
async fn test_refresh_inserts_tables_and_views() {
    let engine = engine();
    let db = MetaDb::open_memory().unwrap();
    let tracker = SyncStateTracker::new(SchemaScanner::new(&engine, &db));

    let report = tracker.refresh("warehouse", "main").await.unwrap();
    assert_eq!(names(&report.inserted), vec!["customers", "open_orders", "orders"]);
    assert!(report.deprecated.is_empty());
    assert_eq!(report.unchanged, 0);
    assert_eq!(status(&db, "open_orders"), SyncStatus::NotScanned);
}

#[tokio::test]
async fn test_refresh_is_idempotent() {
    let engine = engine();
    let db = MetaDb::open_memory().unwrap();
    let tracker = SyncStateTracker::new(SchemaScanner::new(&engine, &db));

    tracker.refresh("warehouse", "main").await.unwrap();
    let before = tracker.descriptions("warehouse", "main").unwrap();

    let again = tracker.refresh("warehouse", "main").await.unwrap();
    assert!(again.inserted.is_empty());
    assert!(again.deprecated.is_empty());
    assert_eq!(again.unchanged, 3);
    assert_eq!(tracker.descriptions("warehouse", "main").unwrap(), before);
}

#[tokio::test]
async fn test_refresh_deprecates_vanished_tables_once() {
    let engine = engine();
    let db = MetaDb::open_memory().unwrap();
    let tracker = SyncStateTracker::new(SchemaScanner::new(&engine, &db));
    tracker.refresh("warehouse", "main").await.unwrap();

    engine.drop_table("orders");
    let report = tracker.refresh("warehouse", "main").await.unwrap();
    assert_eq!(names(&report.deprecated), vec!["orders"]);
    assert_eq!(status(&db, "orders"), SyncStatus::Deprecated);

    let again = tracker.refresh("warehouse", "main").await.unwrap();
    assert!(again.deprecated.is_empty());
    assert_eq!(again.unchanged, 3);
    assert_eq!(status(&db, "orders"), SyncStatus::Deprecated);
}

#[tokio::test]
async fn test_refresh_leaves_scanned_rows_alone() {
    let engine = engine();
    let db = MetaDb::open_memory().unwrap();
    let tracker = SyncStateTracker::new(SchemaScanner::new(&engine, &db));
    tracker.refresh("warehouse", "main").await.unwrap();

    let id = db
        .get_description(&TableKey::new("warehouse", "main", "orders"))
        .unwrap()
        .unwrap()
        .id
        .unwrap();
    tracker.scan_tables(&[id]).await.unwrap();
    tracker.refresh("warehouse", "main").await.unwrap();
    assert_eq!(status(&db, "orders"), SyncStatus::Scanned);
}

#[tokio::test]
async fn test_begin_scan_marks_synchronizing() {
    let engine = engine();
    let db = MetaDb::open_memory().unwrap();
    let tracker = SyncStateTracker::new(SchemaScanner::new(&engine, &db));
    tracker.refresh("warehouse", "main").await.unwrap();

    let ids: Vec<i64> = tracker
        .descriptions("warehouse", "main")
        .unwrap()
        .iter()
        .filter(|d| d.table_name() != "open_orders")
        .filter_map(|d| d.id)
        .collect();

    let targets = tracker.begin_scan(&ids).unwrap();
    assert_eq!(targets.len(), 2);
    assert!(targets
        .iter()
        .all(|d| d.sync_status == SyncStatus::Synchronizing));
    assert_eq!(status(&db, "customers"), SyncStatus::Synchronizing);
    assert_eq!(status(&db, "open_orders"), SyncStatus::NotScanned);
}

#[tokio::test]
async fn test_begin_scan_unknown_id_changes_nothing() {
    let engine = engine();
    let db = MetaDb::open_memory().unwrap();
    let tracker = SyncStateTracker::new(SchemaScanner::new(&engine, &db));
    tracker.refresh("warehouse", "main").await.unwrap();
    let id = tracker.descriptions("warehouse", "main").unwrap()[0]
        .id
        .unwrap();

    let err = tracker.begin_scan(&[id, 9999]).unwrap_err();
    assert!(matches!(err, ScanError::UnknownTable(9999)));
    assert_eq!(status(&db, "customers"), SyncStatus::NotScanned);
}

#[tokio::test]
async fn test_scan_revives_deprecated_table() {
    let engine = engine();
    let db = MetaDb::open_memory().unwrap();
    let tracker = SyncStateTracker::new(SchemaScanner::new(&engine, &db));
    tracker.refresh("warehouse", "main").await.unwrap();

    let orders = db
        .get_description(&TableKey::new("warehouse", "main", "orders"))
        .unwrap()
        .unwrap();
    db.set_sync_status(&[orders.id.unwrap()], SyncStatus::Deprecated)
        .unwrap();

    tracker.refresh("warehouse", "main").await.unwrap();
    assert_eq!(status(&db, "orders"), SyncStatus::Deprecated);

    let report = tracker.scan_tables(&[orders.id.unwrap()]).await.unwrap();
    assert_eq!(report.scanned.len(), 1);
    assert_eq!(status(&db, "orders"), SyncStatus::Scanned);
}

#[tokio::test]
async fn test_failed_table_can_be_retried() {
    let db = MetaDb::open_memory().unwrap();
    let broken = engine().failing("orders", |t| mf_db::DbError::ExecutionError(t.to_string()));
    let tracker = SyncStateTracker::new(SchemaScanner::new(&broken, &db));
    tracker.refresh("warehouse", "main").await.unwrap();
    let id = db
        .get_description(&TableKey::new("warehouse", "main", "orders"))
        .unwrap()
        .unwrap()
        .id
        .unwrap();
    tracker.scan_tables(&[id]).await.unwrap();
    assert_eq!(status(&db, "orders"), SyncStatus::Failed);

    let fixed = engine();
    let tracker = SyncStateTracker::new(SchemaScanner::new(&fixed, &db));
    tracker.scan_tables(&[id]).await.unwrap();
    assert_eq!(status(&db, "orders"), SyncStatus::Scanned);
    let orders = db
        .get_description(&TableKey::new("warehouse", "main", "orders"))
        .unwrap()
        .unwrap();
    assert_eq!(orders.error_message, None);
}
