//! CLI error types with miette diagnostics.
//!
//! Maps core and config errors into user-facing errors with actionable
//! help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use mousesync_config::ConfigError;
use mousesync_core::{CoreError, ValidationError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const DEVICE: i32 = 3;
    pub const UNSUPPORTED: i32 = 4;
    pub const CONFIG: i32 = 5;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(mousesync::validation))]
    Validation { field: String, reason: String },

    // ── Device ───────────────────────────────────────────────────────
    #[error("Device rejected the request: {message}")]
    #[diagnostic(
        code(mousesync::device),
        help("The local view keeps the requested value until the next reconciliation.")
    )]
    Device { message: String },

    #[error("'{operation}' is not supported by this device")]
    #[diagnostic(code(mousesync::unsupported))]
    Unsupported { operation: String },

    #[error("Device settings could not be read: {message}")]
    #[diagnostic(
        code(mousesync::malformed_settings),
        help("Fix or delete the settings file; it is recreated with factory defaults.")
    )]
    MalformedSettings { message: String },

    #[error("Reconciliation timer: {message}")]
    #[diagnostic(code(mousesync::timer))]
    Timer { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(mousesync::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(
        code(mousesync::config),
        help("Check the config file, or print its location with: mousesync config path")
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(mousesync::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => exit_code::USAGE,
            Self::Device { .. } | Self::MalformedSettings { .. } => exit_code::DEVICE,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Config(_) | Self::ConfigExists { .. } => exit_code::CONFIG,
            Self::Timer { .. } | Self::Io(_) | Self::Json(_) => exit_code::GENERAL,
        }
    }
}

// ── Core → CLI mapping ───────────────────────────────────────────────

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::NotReady { .. } => "device",
            ValidationError::UnsupportedPollingRate(_) => "polling rate",
            ValidationError::ResolutionOutOfRange { .. } => "resolution",
            ValidationError::BrightnessOutOfRange(_) => "brightness",
            ValidationError::BatteryOutOfRange(_) => "battery level",
            ValidationError::EmptyStageTable
            | ValidationError::ActiveStageCount(_)
            | ValidationError::StageIndices { .. }
            | ValidationError::UnknownStage(_) => "stages",
        };
        CliError::Validation {
            field: field.into(),
            reason: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => e.into(),
            CoreError::RemoteCall { operation, message } => CliError::Device {
                message: format!("{operation}: {message}"),
            },
            CoreError::Unsupported { operation } => CliError::Unsupported { operation },
            CoreError::Parse { message } => CliError::MalformedSettings { message },
            CoreError::TimerLifecycle { message } => CliError::Timer { message },
        }
    }
}
