use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn sscc(config: &str) -> (Command, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, config).unwrap();

    let mut cmd = Command::cargo_bin("sscc").unwrap();
    cmd.arg("--config").arg(&path).env_remove("SSCC_TOKEN");
    (cmd, dir)
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("sscc").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("setpos"))
        .stdout(predicate::str::contains("canctrl"))
        .stdout(predicate::str::contains("search"));
}

#[test]
fn test_ping_not_running() {
    let (mut cmd, _dir) = sscc("[process]\nname = \"sscc-test-no-such-process\"\n");
    cmd.arg("ping")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not running"));
}

#[test]
fn test_kill_not_running_fails() {
    let (mut cmd, _dir) = sscc("[process]\nname = \"sscc-test-no-such-process\"\n");
    cmd.arg("kill")
        .assert()
        .failure()
        .stderr(predicate::str::contains("sscc-test-no-such-process"));
}

#[test]
fn test_seek_rejects_garbage() {
    let (mut cmd, _dir) = sscc("");
    cmd.args(["seek", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_search_requires_term() {
    let (mut cmd, _dir) = sscc("");
    cmd.args(["search", "artist"]).assert().failure();
}

#[test]
fn test_search_bad_endpoint() {
    let (mut cmd, _dir) = sscc("[search]\nendpoint = \"not a url\"\n");
    cmd.args(["search", "track", "tribute"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid search endpoint"));
}

#[test]
fn test_invalid_config_fails() {
    let (mut cmd, _dir) = sscc("[process\nname = 1");
    cmd.arg("ping")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_pid_not_running_fails() {
    let (mut cmd, _dir) = sscc("[process]\nname = \"sscc-test-no-such-process\"\n");
    cmd.arg("pid")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not running"));
}
