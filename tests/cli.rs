//! Command-line surface of the `modelsync` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn modelsync(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("modelsync").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("MODELSYNC_TOKEN")
        .env_remove("MODELSYNC_API_HOST")
        .env_remove("MODELSYNC_CLOUD");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let tmp = TempDir::new().unwrap();
    modelsync(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("models"))
        .stdout(predicate::str::contains("set-model"));
}

#[test]
fn test_version() {
    let tmp = TempDir::new().unwrap();
    modelsync(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_models_custom_help() {
    let tmp = TempDir::new().unwrap();
    modelsync(&tmp)
        .args(["models", "custom", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--save"))
        .stdout(predicate::str::contains("--file"));
}

#[test]
fn test_missing_token_fails() {
    let tmp = TempDir::new().unwrap();
    modelsync(&tmp)
        .args(["models", "available"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("MODELSYNC_TOKEN"));
}

#[test]
fn test_invalid_cloud_env_fails() {
    let tmp = TempDir::new().unwrap();
    modelsync(&tmp)
        .env("MODELSYNC_CLOUD", "sometimes")
        .args(["models", "available"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("MODELSYNC_CLOUD"));
}
