// ── Device domain types ──

use std::fmt;

use serde::{Deserialize, Serialize};

use super::stage::{ResolutionStage, StageDisplayMode, StageTable};
use crate::error::ValidationError;

/// Report rate of the device, in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum PollingRate {
    Hz125,
    Hz250,
    Hz500,
    Hz1000,
}

impl PollingRate {
    pub const ALL: [PollingRate; 4] = [Self::Hz125, Self::Hz250, Self::Hz500, Self::Hz1000];

    pub fn hz(self) -> u16 {
        match self {
            Self::Hz125 => 125,
            Self::Hz250 => 250,
            Self::Hz500 => 500,
            Self::Hz1000 => 1000,
        }
    }
}

impl TryFrom<u16> for PollingRate {
    type Error = ValidationError;

    fn try_from(hz: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|rate| rate.hz() == hz)
            .ok_or(ValidationError::UnsupportedPollingRate(hz))
    }
}

impl From<PollingRate> for u16 {
    fn from(rate: PollingRate) -> Self {
        rate.hz()
    }
}

impl fmt::Display for PollingRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.hz())
    }
}

/// Pointer resolution as an (x, y) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub x: u16,
    pub y: u16,
}

impl Resolution {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

/// Inclusive resolution range the device accepts on either axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionBounds {
    pub min: u16,
    pub max: u16,
}

impl ResolutionBounds {
    pub const fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    /// Both axes must be positive and inside `min..=max`.
    pub fn check(&self, resolution: Resolution) -> Result<Resolution, ValidationError> {
        let min = self.min.max(1);
        let range = min..=self.max;
        if range.contains(&resolution.x) && range.contains(&resolution.y) {
            Ok(resolution)
        } else {
            Err(ValidationError::ResolutionOutOfRange {
                x: resolution.x,
                y: resolution.y,
                min,
                max: self.max,
            })
        }
    }
}

impl Default for ResolutionBounds {
    fn default() -> Self {
        Self::new(100, 35_000)
    }
}

/// Illumination brightness must be a percentage.
pub fn check_brightness(level: u8) -> Result<u8, ValidationError> {
    if level <= 100 {
        Ok(level)
    } else {
        Err(ValidationError::BrightnessOutOfRange(level))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IlluminationBehavior {
    None,
    Static,
}

/// Operating system the device reports it is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TargetPlatform {
    Windows,
    Linux,
    Macos,
    #[serde(other)]
    Unknown,
}

/// The complete record of device configuration at a point in time.
///
/// Owned by the [`DeviceStore`](crate::DeviceStore); consumers receive
/// `Arc` snapshots and request changes through the
/// [`Controller`](crate::Controller).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSnapshot {
    pub battery_level: u8,
    pub is_charging: bool,
    pub polling_rate: PollingRate,
    pub resolution: Resolution,
    pub illumination_brightness: u8,
    pub illumination_color: RgbColor,
    pub illumination_behavior: IlluminationBehavior,
    pub target_platform: TargetPlatform,
    pub smart_wheel_enabled: bool,
    pub scroll_inverted: bool,
    pub stages: StageTable,
}

impl DeviceSnapshot {
    pub fn active_stage(&self) -> &ResolutionStage {
        self.stages.active()
    }

    /// Stages as presented in the given mode.
    ///
    /// Single mode exposes one implicit, active stage carrying the live
    /// resolution; multi mode exposes the full ordered table.
    pub fn displayed_stages(&self, mode: StageDisplayMode) -> Vec<ResolutionStage> {
        match mode {
            StageDisplayMode::Single => vec![ResolutionStage {
                index: 1,
                resolution: self.resolution,
                active: true,
            }],
            StageDisplayMode::Multi => self.stages.stages().to_vec(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn polling_rate_accepts_only_the_four_rates() {
        for hz in [125, 250, 500, 1000] {
            assert_eq!(PollingRate::try_from(hz).unwrap().hz(), hz);
        }
        for hz in [0, 124, 126, 333, 2000, 8000] {
            assert_eq!(
                PollingRate::try_from(hz),
                Err(ValidationError::UnsupportedPollingRate(hz))
            );
        }
    }

    #[test]
    fn polling_rate_serializes_as_number() {
        assert_eq!(serde_json::to_string(&PollingRate::Hz500).unwrap(), "500");
        assert!(serde_json::from_str::<PollingRate>("300").is_err());
    }

    #[test]
    fn bounds_reject_zero_and_out_of_range_axes() {
        let bounds = ResolutionBounds::new(0, 35_000);
        assert!(bounds.check(Resolution::new(0, 800)).is_err());
        assert!(bounds.check(Resolution::new(800, 35_001)).is_err());
        assert!(bounds.check(Resolution::new(1, 35_000)).is_ok());
    }

    #[test]
    fn bounds_error_reports_effective_minimum() {
        let bounds = ResolutionBounds::new(0, 8_000);
        let err = bounds.check(Resolution::new(0, 800)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ResolutionOutOfRange {
                x: 0,
                y: 800,
                min: 1,
                max: 8_000
            }
        );
        assert!(err.to_string().contains("1..=8000"), "{err}");
    }

    #[test]
    fn brightness_above_hundred_is_invalid() {
        assert_eq!(check_brightness(100), Ok(100));
        assert_eq!(
            check_brightness(101),
            Err(ValidationError::BrightnessOutOfRange(101))
        );
    }

    #[test]
    fn unknown_platform_strings_map_to_unknown() {
        let platform: TargetPlatform = serde_json::from_str("\"freebsd\"").unwrap();
        assert_eq!(platform, TargetPlatform::Unknown);
        let platform: TargetPlatform = serde_json::from_str("\"macos\"").unwrap();
        assert_eq!(platform, TargetPlatform::Macos);
    }

    #[test]
    fn displayed_stages_by_mode() {
        let stages = StageTable::new(vec![
            ResolutionStage::new(1, 400, 400, false),
            ResolutionStage::new(2, 1600, 1600, true),
        ])
        .unwrap();
        let snap = DeviceSnapshot {
            battery_level: 50,
            is_charging: false,
            polling_rate: PollingRate::Hz1000,
            resolution: Resolution::new(1200, 1200),
            illumination_brightness: 100,
            illumination_color: RgbColor::default(),
            illumination_behavior: IlluminationBehavior::Static,
            target_platform: TargetPlatform::Linux,
            smart_wheel_enabled: false,
            scroll_inverted: false,
            stages,
        };

        let single = snap.displayed_stages(StageDisplayMode::Single);
        assert_eq!(single, vec![ResolutionStage::new(1, 1200, 1200, true)]);

        let multi = snap.displayed_stages(StageDisplayMode::Multi);
        assert_eq!(multi.len(), 2);
        assert_eq!(snap.active_stage().index, 2);
    }
}
