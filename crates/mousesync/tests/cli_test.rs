//! Integration tests for the `mousesync` CLI binary.
//!
//! Every test runs against a settings document in a temporary directory,
//! so no real device or user configuration is touched.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn settings(&self) -> PathBuf {
        self.dir.path().join("settings.json")
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    /// `mousesync` with env isolation and sandboxed config/settings paths.
    fn cmd(&self) -> assert_cmd::Command {
        let home = self.dir.path().join("home");
        let mut cmd = cargo_bin_cmd!("mousesync");
        cmd.env("HOME", &home)
            .env("XDG_CONFIG_HOME", &home)
            .env("XDG_DATA_HOME", &home)
            .env_remove("RUST_LOG")
            .env_remove("MOUSESYNC_CONFIG")
            .env_remove("MOUSESYNC_SETTINGS")
            .env_remove("MOUSESYNC_OUTPUT")
            .env_remove("MOUSESYNC_SYNC__RECONCILE_INTERVAL_SECS")
            .env_remove("MOUSESYNC_SYNC__FAILURE_POLICY")
            .arg("--config")
            .arg(self.config())
            .arg("--settings")
            .arg(self.settings());
        cmd
    }

    fn show_json(&self) -> Value {
        let output = self.cmd().args(["show", "-o", "json"]).output().unwrap();
        assert!(output.status.success(), "{output:?}");
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn stored(&self) -> Value {
        read_json(&self.settings())
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn active_stage(snapshot: &Value) -> u64 {
    let active: Vec<u64> = snapshot["stages"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["active"] == Value::Bool(true))
        .map(|s| s["index"].as_u64().unwrap())
        .collect();
    assert_eq!(active.len(), 1, "{snapshot}");
    active[0]
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = Sandbox::new().cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    Sandbox::new().cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("stages")
            .and(predicate::str::contains("set"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    Sandbox::new()
        .cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mousesync"));
}

// ── Snapshot ────────────────────────────────────────────────────────

#[test]
fn test_show_seeds_factory_defaults() {
    let sandbox = Sandbox::new();
    let snap = sandbox.show_json();

    assert_eq!(snap["polling_rate"], 1000);
    assert_eq!(snap["resolution"]["x"], 3200);
    assert_eq!(snap["battery_level"], 100);
    assert_eq!(active_stage(&snap), 4);
    assert!(sandbox.settings().exists());
}

#[test]
fn test_show_table_output() {
    Sandbox::new()
        .cmd()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Polling rate:  1000 Hz"));
}

#[test]
fn test_battery_reports_level() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .cmd()
        .args(["battery", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["level"], 100);
    assert_eq!(report["is_charging"], false);
}

#[test]
fn test_malformed_settings_exit_code() {
    let sandbox = Sandbox::new();
    std::fs::write(sandbox.settings(), "{ not json").unwrap();

    let output = sandbox.cmd().arg("show").output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("settings"));
}

// ── Set ─────────────────────────────────────────────────────────────

#[test]
fn test_set_polling_rate_persists() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["set", "polling-rate", "500"])
        .assert()
        .success();

    assert_eq!(sandbox.stored()["pollingRate"], 500);
    assert_eq!(sandbox.show_json()["polling_rate"], 500);
}

#[test]
fn test_set_invalid_polling_rate_is_usage_error() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["set", "polling-rate", "300"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("polling rate"));
}

#[test]
fn test_set_brightness_out_of_range_is_usage_error() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["set", "brightness", "150"])
        .assert()
        .code(2);
    // Rejected before any write; the seeded value is untouched
    assert_eq!(sandbox.stored()["backlightBrightness"], 100);
}

#[test]
fn test_set_color_and_scroll() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["set", "color", "#ff0080"])
        .assert()
        .success();
    sandbox
        .cmd()
        .args(["set", "scroll-inverted", "on"])
        .assert()
        .success();

    let stored = sandbox.stored();
    assert_eq!(stored["backlightColor"]["r"], 255);
    assert_eq!(stored["backlightColor"]["b"], 128);
    assert_eq!(stored["mouseWheelInverted"], true);
}

#[test]
fn test_set_resolution_outside_bounds() {
    let sandbox = Sandbox::new();
    std::fs::write(
        sandbox.config(),
        "[sync]\nmin_resolution = 200\nmax_resolution = 8000\n",
    )
    .unwrap();

    sandbox
        .cmd()
        .args(["set", "resolution", "9000"])
        .assert()
        .code(2);
    sandbox
        .cmd()
        .args(["set", "resolution", "1200", "1000"])
        .assert()
        .success();
    assert_eq!(sandbox.stored()["dpiXy"], serde_json::json!([1200, 1000]));
}

// ── Stages ──────────────────────────────────────────────────────────

#[test]
fn test_stages_activate_tracks_resolution() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["stages", "activate", "2"])
        .assert()
        .success();

    let snap = sandbox.show_json();
    assert_eq!(active_stage(&snap), 2);
    assert_eq!(snap["resolution"]["x"], 800);
    assert_eq!(sandbox.stored()["dpiXy"], serde_json::json!([800, 800]));
}

#[test]
fn test_stages_activate_unknown_stage() {
    Sandbox::new()
        .cmd()
        .args(["stages", "activate", "9"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("stage 9"));
}

#[test]
fn test_stages_list_modes() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .cmd()
        .args(["stages", "list", "-o", "json"])
        .output()
        .unwrap();
    let stages: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stages.as_array().unwrap().len(), 5);

    let output = sandbox
        .cmd()
        .args(["stages", "list", "--mode", "single", "-o", "json"])
        .output()
        .unwrap();
    let stages: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stages.as_array().unwrap().len(), 1);
    assert_eq!(stages[0]["resolution"]["x"], 3200);

    sandbox
        .cmd()
        .args(["stages", "list", "--refresh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stage").and(predicate::str::contains("*")));
}

#[test]
fn test_stages_replace_and_edit() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["stages", "replace", "500", "1000", "2000", "--active", "3"])
        .assert()
        .success();
    let snap = sandbox.show_json();
    assert_eq!(snap["stages"].as_array().unwrap().len(), 3);
    assert_eq!(active_stage(&snap), 3);
    assert_eq!(snap["resolution"]["x"], 2000);

    // Editing an inactive stage leaves the live resolution alone
    sandbox
        .cmd()
        .args(["stages", "set", "1", "600"])
        .assert()
        .success();
    let snap = sandbox.show_json();
    assert_eq!(snap["stages"][0]["resolution"]["x"], 600);
    assert_eq!(snap["resolution"]["x"], 2000);
}

#[test]
fn test_stages_replace_without_valid_active_stage() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["stages", "replace", "500", "1000", "--active", "4"])
        .assert()
        .code(2);
    assert_eq!(sandbox.stored()["dpiStages"].as_array().unwrap().len(), 5);
}

// ── Watch ───────────────────────────────────────────────────────────

#[test]
fn test_watch_prints_initial_snapshot() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .cmd()
        .args(["watch", "--count", "1", "--interval", "1", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    let snap: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(snap["polling_rate"], 1000);
}

#[test]
fn test_watch_requires_interval() {
    Sandbox::new()
        .cmd()
        .args(["watch", "--count", "1", "--interval", "0"])
        .assert()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_uses_flag() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_and_show() {
    let sandbox = Sandbox::new();
    sandbox.cmd().args(["config", "init"]).assert().success();
    assert!(sandbox.config().exists());

    sandbox
        .cmd()
        .args(["config", "init"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("--force"));
    sandbox
        .cmd()
        .args(["config", "init", "--force"])
        .assert()
        .success();

    sandbox
        .cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reconcile_interval_secs = 5"));
}

#[test]
fn test_invalid_config_exit_code() {
    let sandbox = Sandbox::new();
    std::fs::write(sandbox.config(), "[sync]\nfailure_policy = \"sometimes\"\n").unwrap();

    sandbox.cmd().arg("show").assert().code(5);
}
