//! Common utilities for integration tests

#![allow(dead_code)] // Not every test file uses every helper

use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get the path to the `intake` binary
///
/// Prefers `CARGO_BIN_EXE_intake` (set by cargo, also under a custom
/// `--target-dir`) and falls back to `cargo_bin()` for local runs.
#[allow(deprecated)] // cargo_bin() is deprecated but needed for fallback
pub fn intake_binary() -> PathBuf {
    std::env::var("CARGO_BIN_EXE_intake")
        .map(PathBuf::from)
        .unwrap_or_else(|_| assert_cmd::cargo::cargo_bin("intake"))
}

/// A Command for `intake` isolated from the caller's environment
///
/// All `INTAKE_*` variables are cleared and `--data-dir` points into `dir`.
pub fn intake_command(dir: &Path) -> Command {
    let mut cmd = Command::new(intake_binary());
    for var in [
        "INTAKE_HOST",
        "INTAKE_PORT",
        "INTAKE_DATA_DIR",
        "INTAKE_STATIC_DIR",
        "INTAKE_BACKUP_DIR",
        "INTAKE_MAX_BACKUPS",
        "INTAKE_UPLOAD_DIR",
        "INTAKE_AUTO_BACKUP",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.current_dir(dir).arg("--data-dir").arg(data_dir(dir));
    cmd
}

pub fn data_dir(root: &Path) -> PathBuf {
    root.join("data")
}

/// Write a data file holding `records` under `<root>/data`
pub fn seed(root: &Path, file_name: &str, records: &Value) {
    let dir = data_dir(root);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(file_name),
        serde_json::to_string_pretty(records).unwrap(),
    )
    .unwrap();
}

/// Read a data file back as JSON
pub fn read_store(root: &Path, file_name: &str) -> Value {
    let raw = fs::read_to_string(data_dir(root).join(file_name)).unwrap();
    serde_json::from_str(&raw).unwrap()
}

/// Registrations dated relative to today, so period counts are stable
pub fn sample_registrations() -> Value {
    let today = chrono::Local::now().date_naive();
    let days_ago = |n: u64| {
        (today - chrono::Days::new(n))
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string()
    };

    serde_json::json!([
        {
            "id": 1001,
            "submitTime": days_ago(0),
            "name": "Li Wei",
            "phone": "13800000001",
            "course": "IELTS",
            "target_country": "UK",
            "status": "pending"
        },
        {
            "id": 1002,
            "submitTime": days_ago(1),
            "name": "Zhang Min",
            "phone": "13800000002",
            "course": "TOEFL",
            "target_country": "USA, Canada",
            "status": "completed"
        },
        {
            "id": 1003,
            "submitTime": days_ago(40),
            "name": "Wang Fang",
            "phone": "13800000003",
            "course": "IELTS",
            "remarks": "prefers evening classes",
            "status": "cancelled"
        }
    ])
}

pub fn sample_contacts() -> Value {
    serde_json::json!([
        {
            "id": 2001,
            "name": "Chen Jie",
            "phone": "13900000001",
            "type": "contact",
            "message": "Call me about summer courses",
            "timestamp": "2026-10-01T09:00:00",
            "submitTime": "2026-10-01 09:00:00"
        }
    ])
}

pub fn temp_root() -> TempDir {
    TempDir::new().unwrap()
}
