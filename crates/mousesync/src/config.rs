//! CLI configuration: thin wrapper around `mousesync_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--config, --settings, --output).

use std::path::PathBuf;

use mousesync_core::ControllerConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use mousesync_config::{Config, config_path, save_config_to};

/// Config file in effect: `--config` flag, else the platform path.
pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(mousesync_config::load_config_from(&active_config_path(global))?)
}

/// Settings document: `--settings` flag, else config, else platform path.
pub fn settings_path(global: &GlobalOpts, cfg: &Config) -> PathBuf {
    global
        .settings
        .clone()
        .unwrap_or_else(|| mousesync_config::settings_path(cfg))
}

/// Output format: `--output` flag, else `[defaults].output`.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> Result<OutputFormat, CliError> {
    if let Some(format) = global.output {
        return Ok(format);
    }
    match cfg.defaults.output.as_str() {
        "table" => Ok(OutputFormat::Table),
        "json" => Ok(OutputFormat::Json),
        other => Err(CliError::Validation {
            field: "defaults.output".into(),
            reason: format!("expected 'table' or 'json', got '{other}'"),
        }),
    }
}

/// Translate config into a `ControllerConfig`, optionally overriding the
/// reconcile interval.
pub fn controller_config(
    cfg: &Config,
    reconcile_interval_secs: Option<u64>,
) -> Result<ControllerConfig, CliError> {
    let mut cfg = cfg.clone();
    if let Some(secs) = reconcile_interval_secs {
        cfg.sync.reconcile_interval_secs = secs;
    }
    Ok(mousesync_config::to_controller_config(&cfg)?)
}
