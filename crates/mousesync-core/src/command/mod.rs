// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The
// controller plans each command into one or more remote writes, each
// tagged with the `Attribute` it touches.

mod plan;

pub(crate) use plan::{RemoteWrite, plan};

use crate::error::CoreError;
use crate::model::{DeviceSnapshot, IlluminationBehavior, ResolutionStage, RgbColor};

/// A mutable (or separately refreshable) slice of the device snapshot.
///
/// Requests are serialized per attribute: each one gets a generation, and
/// only the newest generation's result is allowed to touch shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Attribute {
    PollingRate,
    Resolution,
    IlluminationBrightness,
    IlluminationColor,
    IlluminationBehavior,
    ScrollInverted,
    SmartWheel,
    ResolutionStages,
    Battery,
}

impl Attribute {
    /// Copy this attribute's fields from `from` into `to`.
    pub(crate) fn transfer(self, from: &DeviceSnapshot, to: &mut DeviceSnapshot) {
        match self {
            Self::PollingRate => to.polling_rate = from.polling_rate,
            Self::Resolution => to.resolution = from.resolution,
            Self::IlluminationBrightness => {
                to.illumination_brightness = from.illumination_brightness;
            }
            Self::IlluminationColor => to.illumination_color = from.illumination_color,
            Self::IlluminationBehavior => to.illumination_behavior = from.illumination_behavior,
            Self::ScrollInverted => to.scroll_inverted = from.scroll_inverted,
            Self::SmartWheel => to.smart_wheel_enabled = from.smart_wheel_enabled,
            Self::ResolutionStages => to.stages = from.stages.clone(),
            Self::Battery => {
                to.battery_level = from.battery_level;
                to.is_charging = from.is_charging;
            }
        }
    }
}

/// All write operations against a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Raw Hz value; anything outside 125/250/500/1000 is rejected.
    SetPollingRate(u16),
    SetResolution {
        x: u16,
        y: u16,
    },
    SetIlluminationBrightness(u8),
    SetIlluminationColor(RgbColor),
    SetIlluminationBehavior(IlluminationBehavior),
    SetScrollInverted(bool),
    SetSmartWheelEnabled(bool),
    /// Replace the whole stage table atomically.
    SetResolutionStages(Vec<ResolutionStage>),
    /// Make one stage the only active stage and track its resolution live.
    SetActiveResolutionStage(u8),
    /// Edit one stage; the live resolution follows only if it is active.
    SetStageResolution {
        index: u8,
        x: u16,
        y: u16,
    },
}

/// How a dispatched command settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The device accepted every write.
    Applied,
    /// A device call failed; the error was recorded in the store's error
    /// state.
    Failed { error: CoreError },
    /// A newer request for the same attribute was issued while this one was
    /// in flight, so its result was discarded.
    Superseded,
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            Self::Failed { error } => Some(error),
            Self::Applied | Self::Superseded => None,
        }
    }

    pub fn failure_message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }
}
