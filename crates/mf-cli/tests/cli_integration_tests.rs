//! Integration tests for the `mf` binary.
//!
//! Each test builds a small DuckDB project in a temp directory and drives
//! the CLI end to end.

use mf_db::DuckDbBackend;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::{tempdir, TempDir};

const SHOP: &str = "
    CREATE TABLE customers (id INTEGER PRIMARY KEY, name VARCHAR, tier VARCHAR);
    CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        customer_id INTEGER REFERENCES customers(id),
        status VARCHAR
    );
    INSERT INTO customers VALUES (1, 'ann', 'gold'), (2, 'bob', 'basic');
    INSERT INTO orders VALUES (1, 1, 'open'), (2, 2, 'closed');
";

/// Path to the compiled mf binary
fn mf_bin() -> String {
    env!("CARGO_BIN_EXE_mf").to_string()
}

/// Run `mf` in `project` and return (stdout, stderr, success).
fn run_mf(project: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(mf_bin())
        .arg("--project-dir")
        .arg(project)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute mf with args {:?}: {}", args, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn shop_project() -> TempDir {
    let dir = tempdir().unwrap();
    {
        let db = DuckDbBackend::from_path(&dir.path().join("shop.duckdb")).unwrap();
        db.execute_batch(SHOP).unwrap();
    }
    fs::write(
        dir.path().join("manifold.yml"),
        "name: shop\nconnection:\n  id: shop\n  path: shop.duckdb\n",
    )
    .unwrap();
    dir
}

#[test]
fn test_refresh_scan_build_validate() {
    let project = shop_project();
    let root = project.path();

    let (stdout, stderr, ok) = run_mf(root, &["refresh"]);
    assert!(ok, "refresh failed: {}", stderr);
    assert!(stdout.contains("2 new, 0 deprecated, 0 unchanged"), "{}", stdout);

    let (stdout, _, ok) = run_mf(root, &["status"]);
    assert!(ok);
    assert!(stdout.contains("2 NOT_SCANNED"), "{}", stdout);

    let (stdout, stderr, ok) = run_mf(root, &["scan"]);
    assert!(ok, "scan failed: {}", stderr);
    assert!(stdout.contains("2 scanned, 0 failed"), "{}", stdout);

    let (stdout, stderr, ok) = run_mf(root, &["build"]);
    assert!(ok, "build failed: {}", stderr);
    assert!(stdout.contains("(revision 1)"), "{}", stdout);

    let output = root.join("target/manifest.json");
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["catalog"], "shop");
    assert_eq!(json["schema"], "main");
    assert_eq!(json["models"].as_array().unwrap().len(), 2);
    let relationships = json["relationships"].as_array().unwrap();
    assert_eq!(relationships.len(), 1);
    assert_eq!(relationships[0]["condition"], "orders.customer_id = customers.id");

    let (stdout, stderr, ok) = run_mf(root, &["validate", output.to_str().unwrap()]);
    assert!(ok, "validate failed: {}", stderr);
    assert!(stdout.contains("valid"), "{}", stdout);
}

#[test]
fn test_rebuild_without_changes_keeps_revision() {
    let project = shop_project();
    let root = project.path();

    assert!(run_mf(root, &["scan", "--refresh"]).2);
    assert!(run_mf(root, &["build"]).2);

    let (stdout, stderr, ok) = run_mf(root, &["build", "--no-write"]);
    assert!(ok, "rebuild failed: {}", stderr);
    assert!(stdout.contains("(revision 1)"), "{}", stdout);

    let (stdout, stderr, ok) = run_mf(root, &["export", "--output", "-"]);
    assert!(ok, "export failed: {}", stderr);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["models"].as_array().unwrap().len(), 2);
}

#[test]
fn test_export_without_manifest_fails() {
    let project = shop_project();
    let (_, stderr, ok) = run_mf(project.path(), &["export"]);
    assert!(!ok);
    assert!(stderr.contains("Run `mf build` first"), "{}", stderr);
}

#[test]
fn test_validate_rejects_bad_join_type() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(
        &path,
        r#"{
  "catalog": "shop",
  "schema": "main",
  "models": [{"name": "a", "tableReference": {"table": "a"}}, {"name": "b", "tableReference": {"table": "b"}}],
  "relationships": [{"name": "a_b", "models": ["a", "b"], "joinType": "SIDEWAYS", "condition": "a.id = b.id"}]
}"#,
    )
    .unwrap();

    let (_, stderr, ok) = run_mf(dir.path(), &["validate", path.to_str().unwrap()]);
    assert!(!ok);
    assert!(stderr.contains("bad.json"), "{}", stderr);
}

#[test]
fn test_schema_prints_json_schema() {
    let dir = tempdir().unwrap();
    let (stdout, _, ok) = run_mf(dir.path(), &["schema"]);
    assert!(ok);
    let schema: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(schema["properties"]["models"].is_object());
}

#[test]
fn test_missing_config_fails() {
    let dir = tempdir().unwrap();
    let (_, stderr, ok) = run_mf(dir.path(), &["refresh"]);
    assert!(!ok);
    assert!(stderr.contains("Failed to load project configuration"), "{}", stderr);
}
