// ── Resolution-stage table ──
//
// A dense, ordered table of resolution presets. Construction is the only
// way in, so every `StageTable` value satisfies the invariants: indices run
// 1..=len without gaps or duplicates, and exactly one stage is active.

use serde::{Deserialize, Serialize};

use super::device::Resolution;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionStage {
    /// 1-based position in the table.
    pub index: u8,
    pub resolution: Resolution,
    pub active: bool,
}

impl ResolutionStage {
    pub const fn new(index: u8, x: u16, y: u16, active: bool) -> Self {
        Self {
            index,
            resolution: Resolution::new(x, y),
            active,
        }
    }
}

/// How a stage table is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageDisplayMode {
    /// One implicit stage that mirrors the live resolution.
    #[default]
    Single,
    /// The full ordered table.
    Multi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ResolutionStage>", into = "Vec<ResolutionStage>")]
pub struct StageTable {
    stages: Vec<ResolutionStage>,
    active: usize,
}

impl StageTable {
    /// Validate and order a set of stages.
    ///
    /// Stages are sorted by index first, so callers may pass them in any
    /// order; the resulting table is always ascending.
    pub fn new(mut stages: Vec<ResolutionStage>) -> Result<Self, ValidationError> {
        if stages.is_empty() {
            return Err(ValidationError::EmptyStageTable);
        }

        stages.sort_by_key(|s| s.index);
        let dense = stages
            .iter()
            .enumerate()
            .all(|(pos, s)| usize::from(s.index) == pos + 1);
        if !dense {
            return Err(ValidationError::StageIndices {
                expected_len: stages.len(),
                found: stages.iter().map(|s| s.index).collect(),
            });
        }

        let active_count = stages.iter().filter(|s| s.active).count();
        if active_count != 1 {
            return Err(ValidationError::ActiveStageCount(active_count));
        }
        let active = stages.iter().position(|s| s.active).unwrap_or_default();

        Ok(Self { stages, active })
    }

    pub fn stages(&self) -> &[ResolutionStage] {
        &self.stages
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolutionStage> {
        self.stages.iter()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn active(&self) -> &ResolutionStage {
        &self.stages[self.active]
    }

    pub fn get(&self, index: u8) -> Option<&ResolutionStage> {
        self.stages.iter().find(|s| s.index == index)
    }

    /// Copy of this table with `index` as the only active stage.
    pub fn with_active(&self, index: u8) -> Result<Self, ValidationError> {
        if self.get(index).is_none() {
            return Err(ValidationError::UnknownStage(index));
        }
        let stages = self
            .stages
            .iter()
            .map(|s| ResolutionStage {
                active: s.index == index,
                ..*s
            })
            .collect();
        Self::new(stages)
    }

    /// Copy of this table with one stage's resolution replaced.
    pub fn with_stage_resolution(
        &self,
        index: u8,
        resolution: Resolution,
    ) -> Result<Self, ValidationError> {
        if self.get(index).is_none() {
            return Err(ValidationError::UnknownStage(index));
        }
        let stages = self
            .stages
            .iter()
            .map(|s| {
                if s.index == index {
                    ResolutionStage { resolution, ..*s }
                } else {
                    *s
                }
            })
            .collect();
        Self::new(stages)
    }
}

impl TryFrom<Vec<ResolutionStage>> for StageTable {
    type Error = ValidationError;

    fn try_from(stages: Vec<ResolutionStage>) -> Result<Self, Self::Error> {
        Self::new(stages)
    }
}

impl From<StageTable> for Vec<ResolutionStage> {
    fn from(table: StageTable) -> Self {
        table.stages
    }
}

impl<'a> IntoIterator for &'a StageTable {
    type Item = &'a ResolutionStage;
    type IntoIter = std::slice::Iter<'a, ResolutionStage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.iter()
    }
}
