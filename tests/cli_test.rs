#![cfg(feature = "cli")]
//! CLI subcommand tests.
//!
//! Each subcommand exposes `execute(opts, writer)`; the tests capture
//! output in a `Vec<u8>` and assert on the text and JSON shapes.

use std::path::PathBuf;

use tempfile::TempDir;

use pagekv::cli::{create, del, get, info, set, ts};
use pagekv::KvError;

fn db_path(dir: &TempDir) -> String {
    let path: PathBuf = dir.path().join("cli.pkv");
    path.to_str().unwrap().to_string()
}

fn created_db(dir: &TempDir) -> String {
    let path = db_path(dir);
    let mut out = Vec::new();
    create::execute(
        &create::CreateOptions {
            path: path.clone(),
            elements: 50,
        },
        &mut out,
    )
    .unwrap();
    path
}

fn run_set(path: &str, key: &str, value: &str) {
    let mut out = Vec::new();
    set::execute(
        &set::SetOptions {
            path: path.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        },
        &mut out,
    )
    .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "ok\n");
}

fn run_get(path: &str, key: &str, json: bool) -> String {
    let mut out = Vec::new();
    get::execute(
        &get::GetOptions {
            path: path.to_string(),
            key: key.to_string(),
            json,
        },
        &mut out,
    )
    .unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_create_reports_geometry() {
    let dir = TempDir::new().unwrap();
    let path = db_path(&dir);
    let mut out = Vec::new();
    create::execute(
        &create::CreateOptions {
            path: path.clone(),
            elements: 50,
        },
        &mut out,
    )
    .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("created"));
    assert!(text.contains("pages"));
    assert!(std::fs::metadata(&path).is_ok());
}

#[test]
fn test_create_fails_on_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = created_db(&dir);
    let mut out = Vec::new();
    let result = create::execute(
        &create::CreateOptions {
            path,
            elements: 50,
        },
        &mut out,
    );
    assert!(matches!(result, Err(KvError::CannotOpen(_))));
}

#[test]
fn test_set_then_get() {
    let dir = TempDir::new().unwrap();
    let path = created_db(&dir);

    run_set(&path, "foo", "bar");
    let text = run_get(&path, "foo", false);
    assert!(text.contains("value:"));
    assert!(text.contains("bar"));
}

#[test]
fn test_get_missing_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let path = created_db(&dir);
    let text = run_get(&path, "missing", false);
    assert!(text.contains("not found"));
}

#[test]
fn test_get_json() {
    let dir = TempDir::new().unwrap();
    let path = created_db(&dir);
    run_set(&path, "foo", "bar");

    let report: serde_json::Value = serde_json::from_str(&run_get(&path, "foo", true)).unwrap();
    assert_eq!(report["key"], "foo");
    assert_eq!(report["found"], true);
    assert_eq!(report["value"], "bar");
    assert!(report["first"]["seconds"].as_u64().unwrap() > 0);

    let report: serde_json::Value =
        serde_json::from_str(&run_get(&path, "missing", true)).unwrap();
    assert_eq!(report["found"], false);
    assert!(report.get("value").is_none());
}

#[test]
fn test_del_then_get() {
    let dir = TempDir::new().unwrap();
    let path = created_db(&dir);
    run_set(&path, "foo", "bar");

    let mut out = Vec::new();
    del::execute(
        &del::DelOptions {
            path: path.clone(),
            key: "foo".to_string(),
        },
        &mut out,
    )
    .unwrap();
    assert!(String::from_utf8(out).unwrap().contains("deleted"));

    assert!(run_get(&path, "foo", false).contains("not found"));

    // Second delete reports not found but still succeeds.
    let mut out = Vec::new();
    del::execute(
        &del::DelOptions {
            path,
            key: "foo".to_string(),
        },
        &mut out,
    )
    .unwrap();
    assert!(String::from_utf8(out).unwrap().contains("not found"));
}

#[test]
fn test_ts_output_format() {
    let dir = TempDir::new().unwrap();
    let path = created_db(&dir);
    run_set(&path, "foo", "bar");

    let mut out = Vec::new();
    ts::execute(
        &ts::TsOptions {
            path,
            key: "foo".to_string(),
            json: false,
        },
        &mut out,
    )
    .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("first: "));
    assert!(text.contains("last:  "));
    // YYYY-MM-DD HH:MM:SS.mmm
    let line = text.lines().next().unwrap();
    let stamp = line.trim_start_matches("first: ");
    assert_eq!(stamp.len(), "2026-01-01 00:00:00.000".len());
    assert_eq!(&stamp[4..5], "-");
    assert_eq!(&stamp[13..14], ":");
    assert_eq!(&stamp[19..20], ".");
}

#[test]
fn test_ts_missing_key() {
    let dir = TempDir::new().unwrap();
    let path = created_db(&dir);
    let mut out = Vec::new();
    ts::execute(
        &ts::TsOptions {
            path,
            key: "missing".to_string(),
            json: false,
        },
        &mut out,
    )
    .unwrap();
    assert!(String::from_utf8(out).unwrap().contains("not found"));
}

#[test]
fn test_info_reports_header_fields() {
    let dir = TempDir::new().unwrap();
    let path = created_db(&dir);

    let mut out = Vec::new();
    info::execute(
        &info::InfoOptions {
            path: path.clone(),
            json: false,
        },
        &mut out,
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("version:    3834052067"));
    assert!(text.contains("page size:  4096"));

    let mut out = Vec::new();
    info::execute(&info::InfoOptions { path, json: true }, &mut out).unwrap();
    let report: serde_json::Value =
        serde_json::from_str(&String::from_utf8(out).unwrap()).unwrap();
    assert_eq!(report["version"], 3_834_052_067u64);
    assert_eq!(
        report["file_bytes"],
        report["page_count"].as_u64().unwrap() * 4096
    );
}

#[test]
fn test_get_on_missing_database() {
    let dir = TempDir::new().unwrap();
    let mut out = Vec::new();
    let result = get::execute(
        &get::GetOptions {
            path: db_path(&dir),
            key: "k".to_string(),
            json: false,
        },
        &mut out,
    );
    assert!(matches!(result, Err(KvError::CannotOpen(_))));
}
