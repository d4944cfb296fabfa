// ── Runtime controller configuration ──
//
// Describes *how* the controller synchronizes with the device. Built by
// the configuration crate or the caller and handed in; core never reads
// config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::ResolutionBounds;

/// What happens to an optimistic local value when its remote write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FailurePolicy {
    /// Leave the optimistic value in place; reconciliation corrects drift.
    #[default]
    KeepOptimistic,
    /// Restore the attribute's pre-request value, unless a newer request
    /// for the same attribute has been issued since.
    Rollback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Interval between full reconciliation reads. Zero disables the loop.
    pub reconcile_interval: Duration,
    pub failure_policy: FailurePolicy,
    /// Resolution range advertised by the device.
    pub resolution_bounds: ResolutionBounds,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(5),
            failure_policy: FailurePolicy::default(),
            resolution_bounds: ResolutionBounds::default(),
        }
    }
}
