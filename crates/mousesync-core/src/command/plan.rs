// ── Command planning ──
//
// Validates a command against the current snapshot and expands it into
// the ordered list of remote writes that implement it. Planning is pure:
// nothing is touched until the controller applies the writes.

use super::{Attribute, Command};
use crate::capability::{CapabilityError, DeviceCapability};
use crate::error::ValidationError;
use crate::model::{
    DeviceSnapshot, IlluminationBehavior, PollingRate, Resolution, ResolutionBounds, RgbColor,
    StageTable, check_brightness,
};

/// One validated write against a single attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RemoteWrite {
    PollingRate(PollingRate),
    Resolution(Resolution),
    IlluminationBrightness(u8),
    IlluminationColor(RgbColor),
    IlluminationBehavior(IlluminationBehavior),
    ScrollInverted(bool),
    SmartWheel(bool),
    ResolutionStages(StageTable),
}

impl RemoteWrite {
    pub(crate) fn attribute(&self) -> Attribute {
        match self {
            Self::PollingRate(_) => Attribute::PollingRate,
            Self::Resolution(_) => Attribute::Resolution,
            Self::IlluminationBrightness(_) => Attribute::IlluminationBrightness,
            Self::IlluminationColor(_) => Attribute::IlluminationColor,
            Self::IlluminationBehavior(_) => Attribute::IlluminationBehavior,
            Self::ScrollInverted(_) => Attribute::ScrollInverted,
            Self::SmartWheel(_) => Attribute::SmartWheel,
            Self::ResolutionStages(_) => Attribute::ResolutionStages,
        }
    }

    /// Write the pending value into a local snapshot.
    pub(crate) fn apply(&self, snap: &mut DeviceSnapshot) {
        match self {
            Self::PollingRate(rate) => snap.polling_rate = *rate,
            Self::Resolution(res) => snap.resolution = *res,
            Self::IlluminationBrightness(level) => snap.illumination_brightness = *level,
            Self::IlluminationColor(color) => snap.illumination_color = *color,
            Self::IlluminationBehavior(behavior) => snap.illumination_behavior = *behavior,
            Self::ScrollInverted(flag) => snap.scroll_inverted = *flag,
            Self::SmartWheel(flag) => snap.smart_wheel_enabled = *flag,
            Self::ResolutionStages(table) => snap.stages = table.clone(),
        }
    }

    /// Send the write to the device.
    pub(crate) async fn send(&self, device: &dyn DeviceCapability) -> Result<(), CapabilityError> {
        match self {
            Self::PollingRate(rate) => device.set_polling_rate(*rate).await,
            Self::Resolution(res) => device.set_resolution(*res).await,
            Self::IlluminationBrightness(level) => device.set_illumination_brightness(*level).await,
            Self::IlluminationColor(color) => device.set_illumination_color(*color).await,
            Self::IlluminationBehavior(behavior) => {
                device.set_illumination_behavior(*behavior).await
            }
            Self::ScrollInverted(flag) => device.set_scroll_inverted(*flag).await,
            Self::SmartWheel(flag) => device.set_smart_wheel_enabled(*flag).await,
            Self::ResolutionStages(table) => device.set_resolution_stages(table).await,
        }
    }
}

/// Validate `command` and expand it into remote writes.
///
/// Stage activation and active-stage edits produce two writes (stage table
/// first, then live resolution) that the controller applies locally as one
/// atomic update.
pub(crate) fn plan(
    command: &Command,
    current: &DeviceSnapshot,
    bounds: &ResolutionBounds,
) -> Result<Vec<RemoteWrite>, ValidationError> {
    let writes = match command {
        Command::SetPollingRate(hz) => vec![RemoteWrite::PollingRate(PollingRate::try_from(*hz)?)],

        Command::SetResolution { x, y } => {
            vec![RemoteWrite::Resolution(bounds.check(Resolution::new(*x, *y))?)]
        }

        Command::SetIlluminationBrightness(level) => {
            vec![RemoteWrite::IlluminationBrightness(check_brightness(*level)?)]
        }

        Command::SetIlluminationColor(color) => vec![RemoteWrite::IlluminationColor(*color)],

        Command::SetIlluminationBehavior(behavior) => {
            vec![RemoteWrite::IlluminationBehavior(*behavior)]
        }

        Command::SetScrollInverted(flag) => vec![RemoteWrite::ScrollInverted(*flag)],

        Command::SetSmartWheelEnabled(flag) => vec![RemoteWrite::SmartWheel(*flag)],

        Command::SetResolutionStages(stages) => {
            for stage in stages {
                bounds.check(stage.resolution)?;
            }
            let table = StageTable::new(stages.clone())?;
            let mut writes = vec![RemoteWrite::ResolutionStages(table.clone())];
            if table.active().resolution != current.resolution {
                writes.push(RemoteWrite::Resolution(table.active().resolution));
            }
            writes
        }

        Command::SetActiveResolutionStage(index) => {
            let table = current.stages.with_active(*index)?;
            let resolution = table.active().resolution;
            vec![
                RemoteWrite::ResolutionStages(table),
                RemoteWrite::Resolution(resolution),
            ]
        }

        Command::SetStageResolution { index, x, y } => {
            let resolution = bounds.check(Resolution::new(*x, *y))?;
            let table = current.stages.with_stage_resolution(*index, resolution)?;
            let is_active = table.active().index == *index;
            let mut writes = vec![RemoteWrite::ResolutionStages(table)];
            if is_active {
                writes.push(RemoteWrite::Resolution(resolution));
            }
            writes
        }
    };
    Ok(writes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{ResolutionStage, TargetPlatform};

    fn snapshot() -> DeviceSnapshot {
        DeviceSnapshot {
            battery_level: 80,
            is_charging: false,
            polling_rate: PollingRate::Hz500,
            resolution: Resolution::new(800, 800),
            illumination_brightness: 50,
            illumination_color: RgbColor::new(255, 255, 255),
            illumination_behavior: IlluminationBehavior::Static,
            target_platform: TargetPlatform::Linux,
            smart_wheel_enabled: false,
            scroll_inverted: false,
            stages: StageTable::new(vec![
                ResolutionStage::new(1, 400, 400, false),
                ResolutionStage::new(2, 800, 800, true),
                ResolutionStage::new(3, 1600, 1600, false),
            ])
            .unwrap(),
        }
    }

    fn plan_default(command: &Command) -> Result<Vec<RemoteWrite>, ValidationError> {
        plan(command, &snapshot(), &ResolutionBounds::default())
    }

    #[test]
    fn rejects_invalid_polling_rate() {
        assert_eq!(
            plan_default(&Command::SetPollingRate(300)),
            Err(ValidationError::UnsupportedPollingRate(300))
        );
    }

    #[test]
    fn rejects_resolution_outside_bounds() {
        assert!(plan_default(&Command::SetResolution { x: 0, y: 800 }).is_err());
        assert!(plan_default(&Command::SetResolution { x: 800, y: 40_000 }).is_err());
    }

    #[test]
    fn rejects_brightness_instead_of_clamping() {
        assert_eq!(
            plan_default(&Command::SetIlluminationBrightness(150)),
            Err(ValidationError::BrightnessOutOfRange(150))
        );
    }

    #[test]
    fn activating_a_stage_writes_table_then_resolution() {
        let writes = plan_default(&Command::SetActiveResolutionStage(3)).unwrap();
        assert_eq!(writes.len(), 2);
        let RemoteWrite::ResolutionStages(table) = &writes[0] else {
            panic!("expected stage write first, got {writes:?}");
        };
        assert_eq!(table.active().index, 3);
        assert_eq!(writes[1], RemoteWrite::Resolution(Resolution::new(1600, 1600)));
    }

    #[test]
    fn editing_inactive_stage_leaves_live_resolution_alone() {
        let writes = plan_default(&Command::SetStageResolution {
            index: 1,
            x: 500,
            y: 500,
        })
        .unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].attribute(), Attribute::ResolutionStages);
    }

    #[test]
    fn editing_active_stage_also_writes_live_resolution() {
        let writes = plan_default(&Command::SetStageResolution {
            index: 2,
            x: 900,
            y: 700,
        })
        .unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1], RemoteWrite::Resolution(Resolution::new(900, 700)));
    }

    #[test]
    fn replacing_stages_requires_exactly_one_active() {
        let none_active = vec![
            ResolutionStage::new(1, 400, 400, false),
            ResolutionStage::new(2, 800, 800, false),
        ];
        assert_eq!(
            plan_default(&Command::SetResolutionStages(none_active)),
            Err(ValidationError::ActiveStageCount(0))
        );
    }

    #[test]
    fn replacing_stages_with_same_active_resolution_skips_resolution_write() {
        let stages = vec![
            ResolutionStage::new(1, 400, 400, false),
            ResolutionStage::new(2, 800, 800, true),
        ];
        let writes = plan_default(&Command::SetResolutionStages(stages)).unwrap();
        assert_eq!(writes.len(), 1);
    }
}
