//! End-to-end tests for the livelist binary.

use assert_cmd::Command;
use list_controller::{MemoryStore, RecordStore};
use list_types::{QueryDescriptor, RecordId};
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

fn livelist(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("livelist").unwrap();
    cmd.arg("--data-dir").arg(data_dir).env_remove("RUST_LOG");
    cmd
}

/// Record ids in list order, read back from the persisted store.
fn stored_order(data_dir: &Path) -> Vec<RecordId> {
    let store = MemoryStore::load(&data_dir.join("store.json")).unwrap();
    let descriptor = QueryDescriptor::new("Event")
        .sort_by("position", true)
        .sort_by("timeStamp", true);
    store
        .execute_query(&descriptor)
        .unwrap()
        .records()
        .map(|r| r.id())
        .collect()
}

// ===========================================
// Commands
// ===========================================

#[test]
fn list_on_fresh_dir_is_empty() {
    let dir = tempdir().unwrap();
    livelist(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Event ==="))
        .stdout(predicate::str::contains("(empty)"));
}

#[test]
fn add_appends_rows_with_positions() {
    let dir = tempdir().unwrap();
    livelist(dir.path())
        .arg("add")
        .assert()
        .success()
        .stdout(predicate::str::contains("Added event at position 0"));
    livelist(dir.path())
        .arg("add")
        .assert()
        .success()
        .stdout(predicate::str::contains("Added event at position 1"))
        .stdout(predicate::str::is_match(r"  0  \d+ - 0\n  1  \d+ - 1\n").unwrap());

    assert!(dir.path().join("store.json").exists());
    assert_eq!(stored_order(dir.path()).len(), 2);
}

#[test]
fn move_reorders_persisted_records() {
    let dir = tempdir().unwrap();
    for _ in 0..3 {
        livelist(dir.path()).arg("add").assert().success();
    }
    let before = stored_order(dir.path());

    livelist(dir.path())
        .args(["move", "0", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved row 0 to 2"))
        .stdout(predicate::str::is_match(r"  0  \d+ - 0\n  1  \d+ - 1\n  2  \d+ - 2\n").unwrap());

    let after = stored_order(dir.path());
    assert_eq!(after, vec![before[1], before[2], before[0]]);
}

#[test]
fn move_out_of_range_fails() {
    let dir = tempdir().unwrap();
    livelist(dir.path()).arg("add").assert().success();

    livelist(dir.path())
        .args(["move", "0", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to move row 0 to 5"));
}

#[test]
fn delete_removes_row() {
    let dir = tempdir().unwrap();
    for _ in 0..3 {
        livelist(dir.path()).arg("add").assert().success();
    }
    let before = stored_order(dir.path());

    livelist(dir.path())
        .args(["delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted row 1"));

    assert_eq!(stored_order(dir.path()), vec![before[0], before[2]]);
}

#[test]
fn delete_missing_row_fails() {
    let dir = tempdir().unwrap();
    livelist(dir.path())
        .args(["delete", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to delete row 0"));
}

#[test]
fn status_shows_list_details() {
    let dir = tempdir().unwrap();
    livelist(dir.path()).arg("add").assert().success();

    livelist(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Entity:   Event"))
        .stdout(predicate::str::contains("Rows:     1"))
        .stdout(predicate::str::contains("Cache:    Master"))
        .stdout(predicate::str::contains("store.json"));
}

// ===========================================
// Configuration
// ===========================================

#[test]
fn config_in_data_dir_sets_title() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("livelist.toml"), "[list]\ntitle = \"Chores\"\n").unwrap();

    livelist(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Chores ==="));
}

#[test]
fn config_can_disable_editing() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("readonly.toml");
    std::fs::write(&config, "[list]\nallow_editing = false\n").unwrap();

    livelist(dir.path()).arg("add").assert().success();
    livelist(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["delete", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Editing is disabled"));
    assert_eq!(stored_order(dir.path()).len(), 1);
}

#[test]
fn invalid_config_fails() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("livelist.toml"), "[list\n").unwrap();

    livelist(dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config file"));
}

#[test]
fn verbose_traces_surface_primitives() {
    let dir = tempdir().unwrap();
    livelist(dir.path()).arg("add").assert().success();

    livelist(dir.path())
        .args(["-v", "add"])
        .assert()
        .success()
        .stderr(predicate::str::contains("surface: insert rows"));
}
