//! Corruption recovery tests for the bactrack binary.
//!
//! These tests verify the system can handle:
//! - Corrupted tracker files
//! - Missing files and directories
//! - Partial writes

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("bactrack"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_tracker_file() {
    let temp_dir = setup_test_dir();

    // Write corrupted tracker file
    let tracker_path = temp_dir.path().join("tracker.json");
    fs::write(&tracker_path, "{ invalid json }}}}").expect("Failed to write corrupted tracker");

    // Status degrades to the empty default rather than failing
    cli()
        .arg("status")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("BAC: 0.000"));
}

#[test]
fn test_write_after_corruption_recovers() {
    let temp_dir = setup_test_dir();

    let tracker_path = temp_dir.path().join("tracker.json");
    fs::write(&tracker_path, "corrupted").unwrap();

    // Writing through the corrupt state starts from defaults and succeeds
    cli()
        .arg("profile")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .arg("--gender")
        .arg("male")
        .arg("--weight")
        .arg("80")
        .arg("--weight-unit")
        .arg("kg")
        .assert()
        .success();

    // Tracker file is valid JSON again
    let content = fs::read_to_string(&tracker_path).expect("Tracker should exist");
    let parsed: Result<serde_json::Value, _> = serde_json::from_str(&content);
    assert!(parsed.is_ok(), "Tracker should be valid JSON");

    // And subsequent reads see the profile
    cli()
        .arg("status")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No profile set").not());
}

#[test]
fn test_partial_tracker_file() {
    let temp_dir = setup_test_dir();

    // Simulate a crash mid-write: truncated JSON document
    let tracker_path = temp_dir.path().join("tracker.json");
    fs::write(&tracker_path, r#"{"profile":{"gender":"male","wei"#).unwrap();

    cli()
        .arg("status")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("BAC: 0.000"));
}

#[test]
fn test_empty_tracker_file() {
    let temp_dir = setup_test_dir();

    fs::write(temp_dir.path().join("tracker.json"), "").unwrap();

    cli()
        .arg("status")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("BAC: 0.000"));
}

#[test]
fn test_missing_data_dir_is_created_on_write() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("does/not/exist/yet");

    cli()
        .arg("add")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--amount")
        .arg("12")
        .arg("--abv")
        .arg("5")
        .assert()
        .success();

    assert!(data_dir.join("tracker.json").exists());
}

#[test]
fn test_tracker_with_unknown_fields_still_loads() {
    let temp_dir = setup_test_dir();

    // A tracker written by a newer version with extra fields
    let tracker_path = temp_dir.path().join("tracker.json");
    fs::write(
        &tracker_path,
        r#"{
            "profile": {"gender": "female", "weight": 150.0, "weightUnit": "lb"},
            "beverages": [
                {"id": 1, "amount": 12.0, "volumeUnit": "oz", "abv": 5.0,
                 "consumedTime": "2025-01-11T20:00:00Z", "note": "ipa"}
            ],
            "lastBeverageId": 1,
            "schemaHint": 2
        }"#,
    )
    .unwrap();

    cli()
        .arg("list")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("12 oz"));
}

#[test]
fn test_permission_denied_tracker() {
    // Skip on Windows (permission model is different)
    if cfg!(windows) {
        return;
    }

    let temp_dir = setup_test_dir();
    let tracker_path = temp_dir.path().join("tracker.json");
    fs::write(&tracker_path, "{}").unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&tracker_path).unwrap().permissions();
        perms.set_mode(0o000); // No permissions
        fs::set_permissions(&tracker_path, perms).unwrap();

        // Reads degrade to defaults instead of failing
        cli()
            .arg("status")
            .arg("--data-dir")
            .arg(temp_dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("BAC: 0.000"));

        // Clean up permissions for temp dir cleanup
        let mut perms = fs::metadata(&tracker_path).unwrap().permissions();
        perms.set_mode(0o644);
        fs::set_permissions(&tracker_path, perms).unwrap();
    }
}
