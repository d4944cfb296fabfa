//! Shared configuration for mousesync tools.
//!
//! TOML file + environment layering and translation to
//! `mousesync_core::ControllerConfig`. The CLI adds flag-aware wrappers on
//! top; the core never reads files itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mousesync_core::{ControllerConfig, FailurePolicy, ResolutionBounds};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    /// How the controller keeps local state in step with the device.
    #[serde(default)]
    pub sync: SyncSection,

    #[serde(default)]
    pub device: DeviceSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Output format: "table" or "json".
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SyncSection {
    /// Seconds between full reconciliation reads; 0 disables the loop.
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_secs: u64,

    /// "keep-optimistic" or "rollback".
    #[serde(default = "default_failure_policy")]
    pub failure_policy: String,

    #[serde(default = "default_min_resolution")]
    pub min_resolution: u16,

    #[serde(default = "default_max_resolution")]
    pub max_resolution: u16,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            reconcile_interval_secs: default_reconcile_interval(),
            failure_policy: default_failure_policy(),
            min_resolution: default_min_resolution(),
            max_resolution: default_max_resolution(),
        }
    }
}

fn default_reconcile_interval() -> u64 {
    5
}
fn default_failure_policy() -> String {
    FailurePolicy::KeepOptimistic.to_string()
}
fn default_min_resolution() -> u16 {
    ResolutionBounds::default().min
}
fn default_max_resolution() -> u16 {
    ResolutionBounds::default().max
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct DeviceSection {
    /// Settings document backing the file device. Defaults to the
    /// platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_file: Option<PathBuf>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "mousesync", "mousesync")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("mousesync");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Settings document location: `[device].settings_file`, or
/// `settings.json` under the platform data directory.
pub fn settings_path(cfg: &Config) -> PathBuf {
    if let Some(path) = &cfg.device.settings_file {
        return path.clone();
    }
    project_dirs().map_or_else(
        || dirs_fallback().join("settings.json"),
        |dirs| dirs.data_dir().join("settings.json"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load Config from `path` + environment. A missing file yields defaults.
///
/// Environment variables use the `MOUSESYNC_` prefix with `__` between
/// section and key, e.g. `MOUSESYNC_SYNC__FAILURE_POLICY=rollback`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MOUSESYNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

pub fn parse_failure_policy(value: &str) -> Result<FailurePolicy, ConfigError> {
    match value {
        "keep-optimistic" => Ok(FailurePolicy::KeepOptimistic),
        "rollback" => Ok(FailurePolicy::Rollback),
        other => Err(ConfigError::invalid(
            "sync.failure_policy",
            format!("expected 'keep-optimistic' or 'rollback', got '{other}'"),
        )),
    }
}

/// Build a `ControllerConfig` from the `[sync]` section.
pub fn to_controller_config(cfg: &Config) -> Result<ControllerConfig, ConfigError> {
    let sync = &cfg.sync;

    if sync.min_resolution == 0 {
        return Err(ConfigError::invalid(
            "sync.min_resolution",
            "must be at least 1",
        ));
    }
    if sync.min_resolution > sync.max_resolution {
        return Err(ConfigError::invalid(
            "sync.max_resolution",
            format!(
                "{} is below min_resolution {}",
                sync.max_resolution, sync.min_resolution
            ),
        ));
    }

    Ok(ControllerConfig {
        reconcile_interval: Duration::from_secs(sync.reconcile_interval_secs),
        failure_policy: parse_failure_policy(&sync.failure_policy)?,
        resolution_bounds: ResolutionBounds::new(sync.min_resolution, sync.max_resolution),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_translate_to_core_defaults() {
        let cfg = to_controller_config(&Config::default());
        assert!(matches!(cfg, Ok(ref c) if *c == ControllerConfig::default()));
    }

    #[test]
    fn unknown_policy_is_a_validation_error() {
        let err = parse_failure_policy("yolo");
        assert!(matches!(
            err,
            Err(ConfigError::Validation { ref field, .. }) if field == "sync.failure_policy"
        ));
    }
}
