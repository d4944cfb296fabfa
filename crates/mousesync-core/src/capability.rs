// ── Device capability interface ──
//
// The asynchronous request/response surface through which the device is
// read and written. Implemented outside this crate (USB driver, settings
// file, test double); the controller only ever calls it.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    IlluminationBehavior, PollingRate, Resolution, ResolutionStage, RgbColor, StageTable,
    TargetPlatform,
};

/// Failure reported by a [`DeviceCapability`] operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("{operation} failed: {message}")]
    Rejected { operation: String, message: String },

    #[error("{operation} is not supported by this device")]
    Unsupported { operation: String },
}

impl CapabilityError {
    pub fn rejected(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }
}

/// One asynchronous operation per device attribute.
///
/// [`read_snapshot`](Self::read_snapshot) returns the serialized payload
/// described by [`SnapshotPayload`](crate::SnapshotPayload); the controller
/// parses it. Smart-wheel support is optional: devices without it simply
/// keep the default body, which reports [`CapabilityError::Unsupported`].
#[async_trait]
pub trait DeviceCapability: Send + Sync {
    async fn read_snapshot(&self) -> Result<String, CapabilityError>;

    async fn set_polling_rate(&self, rate: PollingRate) -> Result<(), CapabilityError>;

    async fn set_resolution(&self, resolution: Resolution) -> Result<(), CapabilityError>;

    async fn resolution_stages(&self) -> Result<Vec<ResolutionStage>, CapabilityError>;

    async fn set_resolution_stages(&self, stages: &StageTable) -> Result<(), CapabilityError>;

    async fn battery_level(&self) -> Result<u8, CapabilityError>;

    async fn is_charging(&self) -> Result<bool, CapabilityError>;

    async fn set_illumination_brightness(&self, level: u8) -> Result<(), CapabilityError>;

    async fn set_illumination_color(&self, color: RgbColor) -> Result<(), CapabilityError>;

    async fn set_illumination_behavior(
        &self,
        behavior: IlluminationBehavior,
    ) -> Result<(), CapabilityError>;

    async fn target_platform(&self) -> Result<TargetPlatform, CapabilityError>;

    async fn set_scroll_inverted(&self, inverted: bool) -> Result<(), CapabilityError>;

    async fn set_smart_wheel_enabled(&self, enabled: bool) -> Result<(), CapabilityError> {
        let _ = enabled;
        Err(CapabilityError::unsupported("set_smart_wheel_enabled"))
    }
}
