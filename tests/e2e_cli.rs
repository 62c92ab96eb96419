//! CLI end-to-end tests
//!
//! Tests for the reelsmith command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the reelsmith binary
#[allow(deprecated)]
fn reelsmith_cmd() -> Command {
    let mut cmd = Command::cargo_bin("reelsmith").unwrap();
    cmd.env_remove("PEXELS_API_KEY").env_remove("OPENVERSE_TOKEN");
    cmd
}

fn example_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/reelsmith.example.toml")
}

/// A config file whose paths point into `root`.
fn write_config(root: &Path, extra: &str) -> PathBuf {
    let path = root.join("reelsmith.toml");
    let content = format!(
        "[paths]\nassets_dir = {:?}\nmusic_dir = {:?}\noutput_dir = {:?}\n{}",
        root.join("assets"),
        root.join("assets/music"),
        root.join("output"),
        extra
    );
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = reelsmith_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = reelsmith_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("reelsmith"))
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("verify"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = reelsmith_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("reelsmith {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_cli_run_help() {
    let mut cmd = reelsmith_cmd();
    cmd.args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--skip-fetch"))
        .stdout(predicate::str::contains("--date"));
}

#[test]
fn test_cli_validate_example_config() {
    let mut cmd = reelsmith_cmd();
    cmd.arg("validate")
        .arg(example_config())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Scenes: 5 (27-27s)"));
}

#[test]
fn test_cli_validate_rejects_bad_plan() {
    let dir = tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "[[scenes]]\nrole = \"cut\"\nmin_secs = 8\nmax_secs = 4\n",
    );

    let mut cmd = reelsmith_cmd();
    cmd.arg("validate")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file").or(predicate::str::contains("Invalid config file")));
}

#[test]
fn test_cli_validate_rejects_loud_soundtrack() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "[audio]\nvolume = 1.5\n");

    let mut cmd = reelsmith_cmd();
    cmd.arg("validate")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("volume"));
}

#[test]
fn test_cli_fetch_placeholder_key_fails_before_any_io() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = reelsmith_cmd();
    cmd.arg("--config")
        .arg(&config)
        .args(["fetch", "--pexels-key", "YOUR_PEXELS_API_KEY", "--date", "2025-08-22"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("placeholder"));

    assert!(!dir.path().join("assets").exists());
}

#[test]
fn test_cli_fetch_without_key_fails() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let mut cmd = reelsmith_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("fetch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PEXELS_API_KEY"));
}

#[test]
fn test_cli_metadata_without_assets_fails() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "");
    fs::create_dir_all(dir.path().join("assets")).unwrap();

    let mut cmd = reelsmith_cmd();
    cmd.arg("--config")
        .arg(&config)
        .args(["metadata", "--output"])
        .arg(dir.path().join("metadata.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("reelsmith fetch"));

    assert!(!dir.path().join("metadata.json").exists());
}

#[test]
fn test_cli_verify_missing_dir_fails() {
    let dir = tempdir().unwrap();

    let mut cmd = reelsmith_cmd();
    cmd.arg("verify")
        .arg(dir.path().join("2025-08-22"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("manifest.json"));
}

#[test]
fn test_cli_thumbnail_rejects_bad_size() {
    let mut cmd = reelsmith_cmd();
    cmd.args(["thumbnail", "--size", "1280*720"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1280x720"));
}
