// ── Snapshot payload codec ──
//
// The device reports its full state as a JSON document with camelCase
// keys. Decoding is all-or-nothing: a payload that does not parse, or that
// carries a value outside its domain, is a `CoreError::Parse` and never a
// partially applied snapshot.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ValidationError};
use crate::model::{
    DeviceSnapshot, IlluminationBehavior, PollingRate, Resolution, ResolutionStage, RgbColor,
    StageTable, TargetPlatform, check_brightness,
};

/// Wire shape of a full device read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPayload {
    pub battery_level: u8,
    #[serde(default)]
    pub is_charging: bool,
    pub polling_rate: u16,
    pub dpi_xy: [u16; 2],
    pub backlight_brightness: u8,
    pub backlight_color: RgbColor,
    pub matrix_behavior: IlluminationBehavior,
    pub target_os: TargetPlatform,
    pub smart_wheel_enabled: bool,
    pub mouse_wheel_inverted: bool,
    pub dpi_stages: Vec<StagePayload>,
}

/// Wire shape of one resolution stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagePayload {
    pub dpi_x: u16,
    pub dpi_y: u16,
    pub stage: u8,
    pub active: bool,
}

// ── Payload → domain ─────────────────────────────────────────────────

impl From<StagePayload> for ResolutionStage {
    fn from(p: StagePayload) -> Self {
        ResolutionStage::new(p.stage, p.dpi_x, p.dpi_y, p.active)
    }
}

impl TryFrom<SnapshotPayload> for DeviceSnapshot {
    type Error = CoreError;

    fn try_from(p: SnapshotPayload) -> Result<Self, Self::Error> {
        let field = |name: &str, err: ValidationError| CoreError::parse(format!("{name}: {err}"));

        if p.battery_level > 100 {
            return Err(field(
                "batteryLevel",
                ValidationError::BatteryOutOfRange(p.battery_level),
            ));
        }
        let polling_rate =
            PollingRate::try_from(p.polling_rate).map_err(|e| field("pollingRate", e))?;
        let illumination_brightness =
            check_brightness(p.backlight_brightness).map_err(|e| field("backlightBrightness", e))?;
        let stages = StageTable::new(p.dpi_stages.into_iter().map(Into::into).collect())
            .map_err(|e| field("dpiStages", e))?;

        Ok(DeviceSnapshot {
            battery_level: p.battery_level,
            is_charging: p.is_charging,
            polling_rate,
            resolution: Resolution::new(p.dpi_xy[0], p.dpi_xy[1]),
            illumination_brightness,
            illumination_color: p.backlight_color,
            illumination_behavior: p.matrix_behavior,
            target_platform: p.target_os,
            smart_wheel_enabled: p.smart_wheel_enabled,
            scroll_inverted: p.mouse_wheel_inverted,
            stages,
        })
    }
}

// ── Domain → payload ─────────────────────────────────────────────────

impl From<&ResolutionStage> for StagePayload {
    fn from(s: &ResolutionStage) -> Self {
        Self {
            dpi_x: s.resolution.x,
            dpi_y: s.resolution.y,
            stage: s.index,
            active: s.active,
        }
    }
}

impl From<&DeviceSnapshot> for SnapshotPayload {
    fn from(s: &DeviceSnapshot) -> Self {
        Self {
            battery_level: s.battery_level,
            is_charging: s.is_charging,
            polling_rate: s.polling_rate.hz(),
            dpi_xy: [s.resolution.x, s.resolution.y],
            backlight_brightness: s.illumination_brightness,
            backlight_color: s.illumination_color,
            matrix_behavior: s.illumination_behavior,
            target_os: s.target_platform,
            smart_wheel_enabled: s.smart_wheel_enabled,
            mouse_wheel_inverted: s.scroll_inverted,
            dpi_stages: s.stages.iter().map(StagePayload::from).collect(),
        }
    }
}

// ── Entry points ─────────────────────────────────────────────────────

/// Decode a serialized full-snapshot payload.
pub fn parse_snapshot(raw: &str) -> Result<DeviceSnapshot, CoreError> {
    let payload: SnapshotPayload =
        serde_json::from_str(raw).map_err(|e| CoreError::parse(e.to_string()))?;
    DeviceSnapshot::try_from(payload)
}

/// Encode a snapshot in the wire format `parse_snapshot` reads.
pub fn encode_snapshot(snapshot: &DeviceSnapshot) -> serde_json::Result<String> {
    serde_json::to_string(&SnapshotPayload::from(snapshot))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn payload() -> serde_json::Value {
        json!({
            "batteryLevel": 87,
            "isCharging": true,
            "pollingRate": 500,
            "dpiXy": [800, 800],
            "backlightBrightness": 60,
            "backlightColor": { "r": 255, "g": 0, "b": 64 },
            "matrixBehavior": "static",
            "targetOs": "linux",
            "smartWheelEnabled": false,
            "mouseWheelInverted": true,
            "dpiStages": [
                { "dpiX": 400, "dpiY": 400, "stage": 1, "active": false },
                { "dpiX": 800, "dpiY": 800, "stage": 2, "active": true },
                { "dpiX": 1600, "dpiY": 1600, "stage": 3, "active": false }
            ]
        })
    }

    #[test]
    fn parses_complete_payload() {
        let snap = parse_snapshot(&payload().to_string()).unwrap();
        assert_eq!(snap.battery_level, 87);
        assert!(snap.is_charging);
        assert_eq!(snap.polling_rate, PollingRate::Hz500);
        assert_eq!(snap.resolution, Resolution::new(800, 800));
        assert_eq!(snap.illumination_color, RgbColor::new(255, 0, 64));
        assert_eq!(snap.illumination_behavior, IlluminationBehavior::Static);
        assert_eq!(snap.target_platform, TargetPlatform::Linux);
        assert!(snap.scroll_inverted);
        assert_eq!(snap.active_stage().index, 2);
    }

    #[test]
    fn missing_charging_flag_defaults_to_false() {
        let mut value = payload();
        value.as_object_mut().unwrap().remove("isCharging");
        let snap = parse_snapshot(&value.to_string()).unwrap();
        assert!(!snap.is_charging);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_snapshot("{\"batteryLevel\": 50").unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }));
    }

    #[test]
    fn missing_field_is_a_parse_error() {
        let mut value = payload();
        value.as_object_mut().unwrap().remove("dpiStages");
        assert!(matches!(
            parse_snapshot(&value.to_string()),
            Err(CoreError::Parse { .. })
        ));
    }

    #[test]
    fn out_of_domain_values_are_parse_errors() {
        let mut value = payload();
        value["pollingRate"] = json!(333);
        let err = parse_snapshot(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("pollingRate"), "{err}");

        let mut value = payload();
        value["batteryLevel"] = json!(140);
        assert!(parse_snapshot(&value.to_string()).is_err());

        let mut value = payload();
        value["backlightBrightness"] = json!(101);
        assert!(parse_snapshot(&value.to_string()).is_err());
    }

    #[test]
    fn stage_table_without_active_stage_is_rejected() {
        let mut value = payload();
        value["dpiStages"][1]["active"] = json!(false);
        let err = parse_snapshot(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("dpiStages"), "{err}");
    }

    #[test]
    fn encode_then_parse_preserves_snapshot() {
        let snap = parse_snapshot(&payload().to_string()).unwrap();
        let encoded = encode_snapshot(&snap).unwrap();
        assert_eq!(parse_snapshot(&encoded).unwrap(), snap);
    }
}
