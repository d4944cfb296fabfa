// ── Central device store ──
//
// Holds the single canonical snapshot for one device. Readers are
// wait-free (`watch::borrow`); every snapshot write goes through the
// in-flight lock so generation checks and the write happen together.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::lifecycle::{ErrorSource, ErrorState, LifecycleState};
use super::refresh::InFlight;
use crate::error::ValidationError;
use crate::model::DeviceSnapshot;
use crate::stream::SnapshotStream;

/// Reactive store for one device's state.
///
/// The snapshot is `None` until the first full read succeeds, and from then
/// on it is always a complete, invariant-respecting value.
pub struct DeviceStore {
    pub(crate) snapshot: watch::Sender<Option<Arc<DeviceSnapshot>>>,
    pub(crate) lifecycle: watch::Sender<LifecycleState>,
    pub(crate) error: watch::Sender<ErrorState>,
    pub(crate) last_reconciled: watch::Sender<Option<DateTime<Utc>>>,
    pub(crate) in_flight: Mutex<InFlight>,
}

impl DeviceStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(None);
        let (lifecycle, _) = watch::channel(LifecycleState::Uninitialized);
        let (error, _) = watch::channel(ErrorState::Ok);
        let (last_reconciled, _) = watch::channel(None);

        Self {
            snapshot,
            lifecycle,
            error,
            last_reconciled,
            in_flight: Mutex::new(InFlight::default()),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// Current snapshot, or `None` before the first successful load.
    pub fn snapshot(&self) -> Option<Arc<DeviceSnapshot>> {
        self.snapshot.borrow().clone()
    }

    pub fn lifecycle(&self) -> LifecycleState {
        *self.lifecycle.borrow()
    }

    pub fn error_state(&self) -> ErrorState {
        self.error.borrow().clone()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.snapshot.subscribe())
    }

    pub fn subscribe_lifecycle(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }

    pub fn subscribe_errors(&self) -> watch::Receiver<ErrorState> {
        self.error.subscribe()
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_reconciled(&self) -> Option<DateTime<Utc>> {
        *self.last_reconciled.borrow()
    }

    /// How long ago the snapshot was last confirmed by a full read.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_reconciled().map(|t| Utc::now() - t)
    }

    // ── Crate-internal state transitions ─────────────────────────────

    /// The snapshot if the store is ready for commands.
    pub(crate) fn ready_snapshot(&self) -> Result<Arc<DeviceSnapshot>, ValidationError> {
        let state = self.lifecycle();
        match (state, self.snapshot()) {
            (LifecycleState::Ready, Some(snap)) => Ok(snap),
            _ => Err(ValidationError::NotReady { state }),
        }
    }

    /// Move to `to` if the current state is one of `from`.
    ///
    /// Returns the state that was observed.
    pub(crate) fn transition(
        &self,
        from: &[LifecycleState],
        to: LifecycleState,
    ) -> Result<LifecycleState, LifecycleState> {
        let mut observed = LifecycleState::Uninitialized;
        let moved = self.lifecycle.send_if_modified(|state| {
            observed = *state;
            if from.contains(state) {
                *state = to;
                true
            } else {
                false
            }
        });
        if moved { Ok(observed) } else { Err(observed) }
    }

    /// Install a freshly loaded snapshot, discarding any local state.
    pub(crate) fn replace_snapshot(&self, fresh: DeviceSnapshot) {
        let _guard = self.lock_in_flight();
        self.snapshot.send_replace(Some(Arc::new(fresh)));
    }

    pub(crate) fn mark_reconciled(&self) {
        self.last_reconciled.send_replace(Some(Utc::now()));
    }

    pub(crate) fn record_failure(&self, source: ErrorSource, message: impl Into<String>) {
        self.error.send_replace(ErrorState::Failure {
            source,
            message: message.into(),
        });
    }

    /// Clear the error state if it was produced by `source`.
    pub(crate) fn clear_failure(&self, source: ErrorSource) {
        self.error.send_if_modified(|state| {
            if state.source() == Some(source) {
                *state = ErrorState::Ok;
                true
            } else {
                false
            }
        });
    }

    pub(super) fn lock_in_flight(&self) -> MutexGuard<'_, InFlight> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new()
    }
}
