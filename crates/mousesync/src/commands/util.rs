//! Shared helpers for command handlers.

use std::sync::Arc;

use mousesync_core::{CommandOutcome, Controller, DeviceSnapshot};

use crate::error::CliError;

/// Snapshot held by an initialized controller.
pub fn snapshot(controller: &Controller) -> Result<Arc<DeviceSnapshot>, CliError> {
    controller.snapshot().ok_or_else(|| CliError::Device {
        message: format!("no snapshot available (lifecycle: {})", controller.lifecycle()),
    })
}

/// Turn a settled command into a CLI result.
///
/// A superseded request is not an error; the newer request owns the value.
pub fn settle(what: &str, outcome: CommandOutcome) -> Result<(), CliError> {
    match outcome {
        CommandOutcome::Applied => {
            tracing::info!("{what} applied");
            Ok(())
        }
        CommandOutcome::Superseded => {
            tracing::warn!("{what} was superseded by a newer request");
            Ok(())
        }
        CommandOutcome::Failed { error } => Err(error.into()),
    }
}
