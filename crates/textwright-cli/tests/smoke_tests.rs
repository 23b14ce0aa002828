//! Smoke tests for the textwright CLI

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn textwright() -> Command {
    Command::cargo_bin("textwright").expect("textwright binary should exist")
}

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

const VALID: &str = r#"
tests:
  - name: Teams page
    steps:
      - Click "Teams" link.
      - waitForURL: "**/teams"
        pageTitle: "/teams/i"
      - Ensure "Team count" element on the "Teams" section to have text "3".
"#;

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    textwright()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_subcommands() {
    textwright()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("parse"));
}

#[test]
fn test_no_args_fails() {
    textwright().assert().failure();
}

// ============================================================================
// parse
// ============================================================================

#[test]
fn test_parse_prints_json() {
    textwright()
        .args(["parse", "Fill \"Name\" input with value \"Ada\"."])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"action\""))
        .stdout(predicate::str::contains("\"Ada\""));
}

#[test]
fn test_parse_rejects_unknown_action() {
    textwright()
        .args(["parse", "Press \"Submit\" button."])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Press"));
}

// ============================================================================
// check
// ============================================================================

#[test]
fn test_check_valid_file() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "teams.yaml", VALID);
    textwright()
        .args(["check", file.to_str().unwrap(), "--color", "never"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS Click \"Teams\" link."))
        .stdout(predicate::str::contains("1 cases, 3 steps, 2 commands"));
}

#[test]
fn test_check_json() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "teams.yaml", VALID);
    let output = textwright()
        .args(["check", file.to_str().unwrap(), "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["steps"], 3);
    assert_eq!(json["cases"][0]["steps"][0]["commands"][0]["object"], "Teams");
    assert_eq!(json["issues"].as_array().unwrap().len(), 0);
}

#[test]
fn test_check_reports_bad_sentence() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "bad.yaml",
        "tests:\n  - name: broken\n    steps:\n      - Click \"Submit\".\n",
    );
    textwright()
        .args(["check", file.to_str().unwrap(), "--color", "never"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAIL broken (step 1)"))
        .stderr(predicate::str::contains("1 step(s) did not parse"));
}

#[test]
fn test_check_rejects_schema_errors() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "dupes.yaml",
        "tests:\n  - name: a\n    steps:\n      - Click \"A\" link.\n  - name: a\n    steps:\n      - Click \"B\" link.\n",
    );
    textwright()
        .args(["check", file.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Duplicate test name 'a'"));

    let file = write(&dir, "unknown.yaml", "tests: []\nretries: 2\n");
    textwright()
        .args(["check", file.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn test_check_missing_file() {
    textwright()
        .args(["check", "no/such/file.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_run_requires_url() {
    textwright()
        .args(["run", "teams.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--url"));
}
