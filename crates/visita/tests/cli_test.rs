//! Integration tests for the `visita` CLI binary.
//!
//! These tests validate argument parsing, help output, and error
//! handling -- all without requiring a live backend.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `visita` binary with env isolation.
///
/// Clears all `VISITA_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn visita_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("visita");
    cmd.env("HOME", "/tmp/visita-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/visita-cli-test-nonexistent")
        .env_remove("VISITA_PROFILE")
        .env_remove("VISITA_PORTAL")
        .env_remove("VISITA_TOKEN")
        .env_remove("VISITA_OUTPUT")
        .env_remove("VISITA_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = visita_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    visita_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("property visits")
            .and(predicate::str::contains("availability"))
            .and(predicate::str::contains("visits")),
    );
}

#[test]
fn test_version_flag() {
    visita_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("visita"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = visita_cmd().arg("foobar").output().unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid subcommand"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_visits_mine_without_portal_config() {
    visita_cmd()
        .args(["visits", "mine"])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("portal")
                .or(predicate::str::contains("Configuration"))
                .or(predicate::str::contains("profile")),
        );
}

#[test]
fn test_invalid_output_format() {
    let output = visita_cmd()
        .args(["--output", "invalid", "visits", "mine"])
        .output()
        .unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid output format"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid")
            || text.contains("possible values")
            || text.contains("valid value"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_invalid_status_filter() {
    let output = visita_cmd()
        .args(["visits", "mine", "--status", "archived"])
        .output()
        .unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid status filter"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("unknown status") || text.contains("invalid"),
        "Expected error about the status filter:\n{text}"
    );
}

#[test]
fn test_publish_requires_times() {
    let output = visita_cmd()
        .args(["availability", "publish", "prop-1", "--date", "2026-03-14"])
        .output()
        .unwrap();
    assert!(
        !output.status.success(),
        "Expected failure when --times is missing"
    );
}

// ── Pure local commands ─────────────────────────────────────────────

#[test]
fn test_suggest_needs_no_backend() {
    // The suggestion is pure local computation: for a far-future date
    // it must succeed with no portal configured at all.
    visita_cmd()
        .args(["availability", "suggest", "--date", "2099-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains(":"));
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_availability_subcommands_exist() {
    visita_cmd()
        .args(["availability", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("show")
                .and(predicate::str::contains("publish"))
                .and(predicate::str::contains("delete-slot"))
                .and(predicate::str::contains("suggest")),
        );
}

#[test]
fn test_visits_subcommands_exist() {
    visita_cmd()
        .args(["visits", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("mine")
                .and(predicate::str::contains("assigned"))
                .and(predicate::str::contains("create"))
                .and(predicate::str::contains("reschedule"))
                .and(predicate::str::contains("cancel"))
                .and(predicate::str::contains("approve"))
                .and(predicate::str::contains("outcome")),
        );
}
