//! CLI end-to-end tests via the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn version_prints_crate_version() {
    Command::cargo_bin("vidgrab")
        .unwrap()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("vidgrab")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("upscale"))
        .stdout(predicate::str::contains("lookup"))
        .stdout(predicate::str::contains("check-tools"));
}

#[test]
fn validate_without_config_prints_defaults() {
    Command::cargo_bin("vidgrab")
        .unwrap()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("No config file specified"))
        .stdout(predicate::str::contains("0.0.0.0:8080"));
}

#[test]
fn validate_reports_config_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("vidgrab.json");
    std::fs::write(
        &config_path,
        r#"{"fetch": {"max_attempts": 0}, "upscale": {"height": 2161}}"#,
    )
    .unwrap();

    Command::cargo_bin("vidgrab")
        .unwrap()
        .arg("validate")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("warning"))
        .stdout(predicate::str::contains("max_attempts"));
}

#[test]
fn validate_rejects_malformed_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("broken.json");
    std::fs::write(&config_path, "{not json").unwrap();

    Command::cargo_bin("vidgrab")
        .unwrap()
        .arg("validate")
        .arg(&config_path)
        .assert()
        .failure();
}

#[test]
fn upscale_missing_input_fails() {
    Command::cargo_bin("vidgrab")
        .unwrap()
        .args(["upscale", "/nonexistent/input.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn probe_missing_file_fails() {
    Command::cargo_bin("vidgrab")
        .unwrap()
        .args(["probe", "/nonexistent/input.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn check_tools_always_succeeds() {
    Command::cargo_bin("vidgrab")
        .unwrap()
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("yt-dlp"));
}
