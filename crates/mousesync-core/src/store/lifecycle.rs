// ── Store lifecycle and error state ──

use std::fmt;

use serde::Serialize;

use crate::command::Attribute;

/// Where the store is in its load cycle.
///
/// `Uninitialized → Loading → Ready`, or `Loading → Error` on a failed
/// first read. A failed read may be retried from `Error`. Once `Ready`, the
/// store never leaves it: later failures only touch [`ErrorState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Error,
}

/// What produced a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSource {
    /// The first full read.
    Load,
    /// A periodic or on-demand reconciliation read.
    Reconcile,
    /// A write or refresh of one attribute.
    Attribute(Attribute),
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => f.write_str("load"),
            Self::Reconcile => f.write_str("reconcile"),
            Self::Attribute(attr) => write!(f, "{attr}"),
        }
    }
}

/// Most recent unresolved failure.
///
/// A failure is cleared only by a later success from the same source, so a
/// successful reconciliation does not hide a rejected brightness write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ErrorState {
    #[default]
    Ok,
    Failure { source: ErrorSource, message: String },
}

impl ErrorState {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Ok => None,
            Self::Failure { message, .. } => Some(message),
        }
    }

    pub fn source(&self) -> Option<ErrorSource> {
        match self {
            Self::Ok => None,
            Self::Failure { source, .. } => Some(*source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_source_display() {
        assert_eq!(ErrorSource::Load.to_string(), "load");
        assert_eq!(
            ErrorSource::Attribute(Attribute::IlluminationBrightness).to_string(),
            "illumination_brightness"
        );
    }

    #[test]
    fn ok_state_has_no_message() {
        assert_eq!(ErrorState::Ok.message(), None);
        assert!(!ErrorState::default().is_failure());
    }
}
