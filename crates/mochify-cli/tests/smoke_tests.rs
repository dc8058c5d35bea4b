//! Smoke tests for the mochify CLI
//!
//! Everything here fails or exits before a browser is launched.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the mochify binary, run from an empty directory
fn mochify(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mochify").expect("mochify binary should exist");
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    mochify(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    let dir = TempDir::new().unwrap();
    mochify(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mocha"))
        .stdout(predicate::str::contains("--reporter"))
        .stdout(predicate::str::contains("--bundle"))
        .stdout(predicate::str::contains("--coverage-out"));
}

#[test]
fn test_unknown_reporter_is_rejected() {
    let dir = TempDir::new().unwrap();
    mochify(&dir)
        .args(["--reporter", "nyan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nyan"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_missing_config_file() {
    let dir = TempDir::new().unwrap();
    mochify(&dir)
        .args(["--config", "missing.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error: Configuration error"))
        .stderr(predicate::str::contains("missing.json"));
}

#[test]
fn test_invalid_default_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".mochifyrc.json"), "{ nope").unwrap();
    mochify(&dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains(".mochifyrc.json"));
}

#[test]
fn test_config_rejects_unknown_reporter() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".mochifyrc.json"),
        r#"{"reporter": "landing"}"#,
    )
    .unwrap();
    mochify(&dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown reporter \"landing\""));
}

// ============================================================================
// Spec and bundle resolution
// ============================================================================

#[test]
fn test_no_specs_found() {
    let dir = TempDir::new().unwrap();
    mochify(&dir)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no spec files match test/**/*.js"));
}

#[test]
fn test_stdin_cannot_mix_with_patterns() {
    let dir = TempDir::new().unwrap();
    mochify(&dir)
        .args(["-", "test/*.js"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid argument"));
}

#[cfg(unix)]
#[test]
fn test_failing_bundle_command() {
    let dir = TempDir::new().unwrap();
    mochify(&dir)
        .args(["--bundle", "false", "unknown-file.js"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Command failed with exit code 1: false",
        ));
}

#[test]
fn test_unterminated_bundle_command() {
    let dir = TempDir::new().unwrap();
    mochify(&dir)
        .args(["--bundle", "echo 'oops"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unterminated quote"));
}
