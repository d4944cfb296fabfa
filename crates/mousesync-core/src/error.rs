// ── Core error types ──
//
// `ValidationError` is returned synchronously from dispatcher entry points
// and never reaches the store's `ErrorState`. `CoreError` covers everything
// that happens at or after the device boundary; the dispatcher captures it
// into `ErrorState` instead of returning it.

use thiserror::Error;

use crate::capability::CapabilityError;
use crate::store::LifecycleState;

/// Input rejected before any remote call was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("device is not ready (lifecycle: {state})")]
    NotReady { state: LifecycleState },

    #[error("invalid polling rate {0} Hz (expected one of 125, 250, 500, 1000)")]
    UnsupportedPollingRate(u16),

    #[error("resolution {x}x{y} is outside the supported range {min}..={max}")]
    ResolutionOutOfRange { x: u16, y: u16, min: u16, max: u16 },

    #[error("brightness {0} is outside 0..=100")]
    BrightnessOutOfRange(u8),

    #[error("battery level {0} is outside 0..=100")]
    BatteryOutOfRange(u8),

    #[error("resolution stage table is empty")]
    EmptyStageTable,

    #[error("resolution stage table must have exactly one active stage, found {0}")]
    ActiveStageCount(usize),

    #[error("resolution stage indices must run 1..={expected_len} without gaps, found {found:?}")]
    StageIndices { expected_len: usize, found: Vec<u8> },

    #[error("resolution stage {0} does not exist")]
    UnknownStage(u8),
}

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Device rejected {operation}: {message}")]
    RemoteCall { operation: String, message: String },

    #[error("Operation not supported by this device: {operation}")]
    Unsupported { operation: String },

    #[error("Malformed device snapshot: {message}")]
    Parse { message: String },

    #[error("Reconciliation timer: {message}")]
    TimerLifecycle { message: String },
}

impl CoreError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub(crate) fn timer(message: impl Into<String>) -> Self {
        Self::TimerLifecycle {
            message: message.into(),
        }
    }
}

// ── Conversion from device-boundary errors ───────────────────────────

impl From<CapabilityError> for CoreError {
    fn from(err: CapabilityError) -> Self {
        match err {
            CapabilityError::Rejected { operation, message } => {
                CoreError::RemoteCall { operation, message }
            }
            CapabilityError::Unsupported { operation } => CoreError::Unsupported { operation },
        }
    }
}
