// ── Domain model ──
//
// Canonical device state shared by the store, the dispatcher and every
// consumer. Field-level domains (polling rate enumeration, brightness range,
// stage-table invariant) are enforced here or at construction.

mod device;
mod stage;

pub use device::{
    DeviceSnapshot, IlluminationBehavior, PollingRate, Resolution, ResolutionBounds, RgbColor,
    TargetPlatform, check_brightness,
};
pub use stage::{ResolutionStage, StageDisplayMode, StageTable};
