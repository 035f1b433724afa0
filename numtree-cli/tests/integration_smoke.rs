//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("numtree").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("seed"))
        .stdout(predicate::str::contains("verify"));
}

#[test]
fn test_serve_help() {
    let mut cmd = Command::cargo_bin("numtree").unwrap();
    cmd.arg("serve").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--static-dir"))
        .stdout(predicate::str::contains("--skip-migrations"));
}

#[test]
fn test_seed_help() {
    let mut cmd = Command::cargo_bin("numtree").unwrap();
    cmd.arg("seed").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--max-depth"))
        .stdout(predicate::str::contains("--reset"));
}

#[test]
fn test_seed_rejects_shallow_depth() {
    let mut cmd = Command::cargo_bin("numtree").unwrap();
    cmd.args(["seed", "--max-depth", "1"]);

    cmd.assert().failure();
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let mut cmd = Command::cargo_bin("numtree").unwrap();
    cmd.arg("--config").arg(&missing).arg("migrate");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn test_version() {
    let mut cmd = Command::cargo_bin("numtree").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("numtree"));
}
