use super::*;
use mf_core::TableKey;

fn stored(name: &str, id: i64, status: SyncStatus) -> TableDescription {
    let mut desc = TableDescription::discovered(TableKey::new("default", "main", name));
    desc.id = Some(id);
    desc.sync_status = status;
    desc
}

fn fixture() -> Vec<TableDescription> {
    vec![
        stored("customers", 1, SyncStatus::Scanned),
        stored("orders", 2, SyncStatus::NotScanned),
        stored("payments", 3, SyncStatus::Failed),
        stored("legacy", 4, SyncStatus::Deprecated),
    ]
}

#[test]
fn test_select_pending_by_default() {
    let ids = select_targets(&fixture(), &ScanArgs::default()).unwrap();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn test_select_all_skips_deprecated() {
    let args = ScanArgs {
        all: true,
        ..ScanArgs::default()
    };
    let ids = select_targets(&fixture(), &args).unwrap();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_select_named_tables_includes_deprecated() {
    let args = ScanArgs {
        tables: Some("legacy, customers".to_string()),
        ..ScanArgs::default()
    };
    let mut ids = select_targets(&fixture(), &args).unwrap();
    ids.sort();
    assert_eq!(ids, vec![1, 4]);
}

#[test]
fn test_select_unknown_table_fails() {
    let args = ScanArgs {
        tables: Some("nope".to_string()),
        ..ScanArgs::default()
    };
    let err = select_targets(&fixture(), &args).unwrap_err();
    assert!(err.to_string().contains("Unknown table 'nope'"));
}
