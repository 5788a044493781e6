//! Integration tests for CLI argument parsing.
//!
//! Only commands that leave the host untouched are driven end to end here;
//! install and uninstall are covered against fakes in the library tests.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mtr_setup() -> Command {
    let mut cmd = Command::new(cargo_bin("mtr-setup"));
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    mtr_setup()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mtr-logger"))
        .stdout(predicate::str::contains("uninstall"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    mtr_setup()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_schedule_prints_plan() -> Result<(), Box<dyn std::error::Error>> {
    mtr_setup()
        .args(["schedule", "--logs-per-hour", "4", "--safety-margin", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0,15,30,45"))
        .stdout(predicate::str::contains("895"));
    Ok(())
}

#[test]
fn cli_schedule_every_minute() -> Result<(), Box<dyn std::error::Error>> {
    mtr_setup()
        .args(["schedule", "--logs-per-hour", "60", "--safety-margin", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("55s"));
    Ok(())
}

#[test]
fn cli_schedule_rejects_non_divisor() -> Result<(), Box<dyn std::error::Error>> {
    mtr_setup()
        .args(["schedule", "--logs-per-hour", "7"])
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn cli_schedule_rejects_margin_filling_window() -> Result<(), Box<dyn std::error::Error>> {
    mtr_setup()
        .args(["schedule", "--logs-per-hour", "60", "--safety-margin", "60"])
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn cli_status_without_installation_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    mtr_setup()
        .args(["status", "--install-root"])
        .arg(temp.path())
        .assert()
        .code(1);
    Ok(())
}

#[test]
fn cli_completions_bash() -> Result<(), Box<dyn std::error::Error>> {
    mtr_setup()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mtr-setup"));
    Ok(())
}

#[test]
fn cli_debug_flag_accepted() -> Result<(), Box<dyn std::error::Error>> {
    mtr_setup()
        .args(["--debug", "schedule"])
        .assert()
        .success();
    Ok(())
}

#[test]
fn cli_invalid_command_fails() -> Result<(), Box<dyn std::error::Error>> {
    mtr_setup()
        .arg("nonexistent-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
    Ok(())
}
