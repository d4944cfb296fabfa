#![allow(clippy::unwrap_used)]
// Integration tests for config loading, validation and saving.

use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use mousesync_config::{
    Config, ConfigError, load_config_from, save_config_to, settings_path, to_controller_config,
};
use mousesync_core::{FailurePolicy, ResolutionBounds};

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(cfg.sync.reconcile_interval_secs, 5);
    assert_eq!(cfg.sync.failure_policy, "keep-optimistic");
    assert_eq!(cfg.sync.min_resolution, 100);
    assert_eq!(cfg.sync.max_resolution, 35_000);
    assert_eq!(cfg.defaults.output, "table");
    assert!(cfg.device.settings_file.is_none());
}

#[test]
fn test_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[sync]
reconcile_interval_secs = 2
failure_policy = "rollback"
max_resolution = 26000

[device]
settings_file = "/tmp/mouse.json"
"#,
    );

    let cfg = load_config_from(&path).unwrap();
    let controller = to_controller_config(&cfg).unwrap();

    assert_eq!(controller.reconcile_interval, Duration::from_secs(2));
    assert_eq!(controller.failure_policy, FailurePolicy::Rollback);
    assert_eq!(controller.resolution_bounds, ResolutionBounds::new(100, 26_000));
    assert_eq!(settings_path(&cfg), PathBuf::from("/tmp/mouse.json"));
}

#[test]
fn test_zero_interval_disables_loop() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[sync]\nreconcile_interval_secs = 0\n");

    let controller = to_controller_config(&load_config_from(&path).unwrap()).unwrap();
    assert!(controller.reconcile_interval.is_zero());
}

#[test]
fn test_invalid_policy_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[sync]\nfailure_policy = \"sometimes\"\n");

    let err = to_controller_config(&load_config_from(&path).unwrap()).unwrap_err();
    assert!(
        matches!(err, ConfigError::Validation { ref field, .. } if field == "sync.failure_policy"),
        "{err}"
    );
}

#[test]
fn test_inverted_bounds_are_rejected() {
    let mut cfg = Config::default();
    cfg.sync.min_resolution = 5000;
    cfg.sync.max_resolution = 400;
    assert!(matches!(
        to_controller_config(&cfg),
        Err(ConfigError::Validation { .. })
    ));

    cfg.sync.min_resolution = 0;
    cfg.sync.max_resolution = 400;
    assert!(matches!(
        to_controller_config(&cfg),
        Err(ConfigError::Validation { .. })
    ));
}

#[test]
fn test_malformed_toml_is_a_load_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[sync\nreconcile_interval_secs = ");

    assert!(matches!(
        load_config_from(&path),
        Err(ConfigError::Figment(_))
    ));
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut cfg = Config::default();
    cfg.sync.failure_policy = "rollback".into();
    cfg.device.settings_file = Some(dir.path().join("settings.json"));
    save_config_to(&cfg, &path).unwrap();

    assert_eq!(load_config_from(&path).unwrap(), cfg);
}
