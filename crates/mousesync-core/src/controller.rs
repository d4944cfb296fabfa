// ── Controller ──
//
// Lifecycle management for one device: initial load, command dispatch
// with optimistic updates, and the background reconciliation loop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capability::{CapabilityError, DeviceCapability};
use crate::command::{Attribute, Command, CommandOutcome, plan};
use crate::config::ControllerConfig;
use crate::convert::parse_snapshot;
use crate::error::{CoreError, ValidationError};
use crate::model::{DeviceSnapshot, IlluminationBehavior, ResolutionStage, RgbColor, StageTable};
use crate::store::{DeviceStore, ErrorSource, ErrorState, LifecycleState};
use crate::stream::SnapshotStream;

// ── Reconciler slot ──────────────────────────────────────────────

enum ReconcilerSlot {
    Idle,
    Running(JoinHandle<()>),
    Stopped,
}

// ── Controller ───────────────────────────────────────────────────

/// Handle to a device's synchronized state.
///
/// Cheaply cloneable; all clones share one store and one reconciliation
/// loop. The loop stops when [`shutdown`](Self::shutdown) is called or the
/// last handle is dropped.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    device: Arc<dyn DeviceCapability>,
    config: ControllerConfig,
    store: Arc<DeviceStore>,
    cancel: CancellationToken,
    reconciler: Mutex<ReconcilerSlot>,
}

impl ControllerInner {
    fn lock_reconciler(&self) -> MutexGuard<'_, ReconcilerSlot> {
        self.reconciler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Controller {
    /// Bind a controller to a device. No I/O happens until
    /// [`initialize`](Self::initialize).
    pub fn new(device: Arc<dyn DeviceCapability>, config: ControllerConfig) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                device,
                config,
                store: Arc::new(DeviceStore::new()),
                cancel: CancellationToken::new(),
                reconciler: Mutex::new(ReconcilerSlot::Idle),
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Perform the first full read and, once ready, start reconciliation.
    ///
    /// Runs only from `Uninitialized` or `Error`; calling it while loading
    /// or ready is a no-op. A failed read leaves the store in `Error` with
    /// no snapshot and returns the error; the call may be retried.
    pub async fn initialize(&self) -> Result<(), CoreError> {
        let store = &self.inner.store;
        match store.transition(
            &[LifecycleState::Uninitialized, LifecycleState::Error],
            LifecycleState::Loading,
        ) {
            Ok(from) => info!(%from, "loading device snapshot"),
            Err(state) => {
                debug!(%state, "initialize skipped");
                return Ok(());
            }
        }

        match read_full(self.inner.device.as_ref()).await {
            Ok(snapshot) => {
                store.replace_snapshot(snapshot);
                store.mark_reconciled();
                store.clear_failure(ErrorSource::Load);
                let _ = store.transition(&[LifecycleState::Loading], LifecycleState::Ready);
                info!("device ready");
            }
            Err(e) => {
                warn!(error = %e, "initial device read failed");
                store.record_failure(ErrorSource::Load, e.to_string());
                let _ = store.transition(&[LifecycleState::Loading], LifecycleState::Error);
                return Err(e);
            }
        }

        let stopped = matches!(*self.inner.lock_reconciler(), ReconcilerSlot::Stopped);
        if self.inner.config.reconcile_interval.is_zero() || stopped {
            debug!("reconciliation not started");
            return Ok(());
        }
        self.start_reconciliation()
    }

    /// Spawn the periodic reconciliation loop.
    ///
    /// Must be called inside a Tokio runtime. Fails if the store is not
    /// ready, the interval is zero, the loop is already running or the
    /// controller has been shut down.
    pub fn start_reconciliation(&self) -> Result<(), CoreError> {
        let interval = self.inner.config.reconcile_interval;
        if interval.is_zero() {
            return Err(CoreError::timer("reconcile interval is zero"));
        }
        let state = self.inner.store.lifecycle();
        if state != LifecycleState::Ready {
            return Err(CoreError::timer(format!(
                "cannot start before the device is ready (lifecycle: {state})"
            )));
        }

        let mut slot = self.inner.lock_reconciler();
        match *slot {
            ReconcilerSlot::Running(_) => Err(CoreError::timer("reconciliation already running")),
            ReconcilerSlot::Stopped => Err(CoreError::timer("controller has been shut down")),
            ReconcilerSlot::Idle => {
                let handle = tokio::spawn(reconcile_task(
                    Arc::downgrade(&self.inner),
                    interval,
                    self.inner.cancel.clone(),
                ));
                *slot = ReconcilerSlot::Running(handle);
                debug!(interval_ms = interval.as_millis(), "reconciliation started");
                Ok(())
            }
        }
    }

    /// Whether the background loop is currently running.
    pub fn is_reconciling(&self) -> bool {
        match &*self.inner.lock_reconciler() {
            ReconcilerSlot::Running(handle) => !handle.is_finished(),
            ReconcilerSlot::Idle | ReconcilerSlot::Stopped => false,
        }
    }

    /// Stop reconciliation and wait for the loop to exit.
    ///
    /// Cancels exactly once: a second call returns
    /// [`CoreError::TimerLifecycle`].
    pub async fn shutdown(&self) -> Result<(), CoreError> {
        let previous = std::mem::replace(&mut *self.inner.lock_reconciler(), ReconcilerSlot::Stopped);
        match previous {
            ReconcilerSlot::Stopped => Err(CoreError::timer("controller already shut down")),
            ReconcilerSlot::Idle => {
                self.inner.cancel.cancel();
                debug!("shut down before reconciliation started");
                Ok(())
            }
            ReconcilerSlot::Running(handle) => {
                self.inner.cancel.cancel();
                if let Err(e) = handle.await {
                    warn!(error = %e, "reconciliation task ended abnormally");
                }
                info!("reconciliation stopped");
                Ok(())
            }
        }
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Current snapshot; `None` until the first full read succeeds.
    pub fn snapshot(&self) -> Option<Arc<DeviceSnapshot>> {
        self.inner.store.snapshot()
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.inner.store.lifecycle()
    }

    pub fn error_state(&self) -> ErrorState {
        self.inner.store.error_state()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        self.inner.store.subscribe()
    }

    pub fn lifecycle_changes(&self) -> watch::Receiver<LifecycleState> {
        self.inner.store.subscribe_lifecycle()
    }

    // ── Dispatch ─────────────────────────────────────────────────

    /// Validate, apply optimistically, send to the device and settle.
    ///
    /// Validation failures return `Err` without touching the store or the
    /// device. Remote failures are recorded in [`ErrorState`] and reported
    /// as [`CommandOutcome::Failed`].
    pub async fn execute(&self, command: Command) -> Result<CommandOutcome, ValidationError> {
        let inner = &self.inner;
        let bounds = inner.config.resolution_bounds;
        let (ticket, writes) = inner
            .store
            .apply_optimistic(|current| plan(&command, current, &bounds))?;
        debug!(?command, writes = writes.len(), "dispatching command");

        let mut accepted = Vec::with_capacity(writes.len());
        let mut failure = None;
        for write in &writes {
            match write.send(inner.device.as_ref()).await {
                Ok(()) => accepted.push(write.attribute()),
                Err(err) => {
                    warn!(attribute = %write.attribute(), error = %err, "device write failed");
                    failure = Some((write.attribute(), err));
                    break;
                }
            }
        }

        let outcome = inner
            .store
            .settle(ticket, &accepted, failure, inner.config.failure_policy);
        debug!(?outcome, "command settled");
        Ok(outcome)
    }

    pub async fn set_polling_rate(&self, hz: u16) -> Result<CommandOutcome, ValidationError> {
        self.execute(Command::SetPollingRate(hz)).await
    }

    pub async fn set_resolution(&self, x: u16, y: u16) -> Result<CommandOutcome, ValidationError> {
        self.execute(Command::SetResolution { x, y }).await
    }

    pub async fn set_illumination_brightness(
        &self,
        level: u8,
    ) -> Result<CommandOutcome, ValidationError> {
        self.execute(Command::SetIlluminationBrightness(level)).await
    }

    pub async fn set_illumination_color(
        &self,
        color: RgbColor,
    ) -> Result<CommandOutcome, ValidationError> {
        self.execute(Command::SetIlluminationColor(color)).await
    }

    pub async fn set_illumination_behavior(
        &self,
        behavior: IlluminationBehavior,
    ) -> Result<CommandOutcome, ValidationError> {
        self.execute(Command::SetIlluminationBehavior(behavior)).await
    }

    pub async fn set_scroll_inverted(
        &self,
        inverted: bool,
    ) -> Result<CommandOutcome, ValidationError> {
        self.execute(Command::SetScrollInverted(inverted)).await
    }

    pub async fn set_smart_wheel_enabled(
        &self,
        enabled: bool,
    ) -> Result<CommandOutcome, ValidationError> {
        self.execute(Command::SetSmartWheelEnabled(enabled)).await
    }

    pub async fn set_resolution_stages(
        &self,
        stages: Vec<ResolutionStage>,
    ) -> Result<CommandOutcome, ValidationError> {
        self.execute(Command::SetResolutionStages(stages)).await
    }

    pub async fn set_active_resolution_stage(
        &self,
        index: u8,
    ) -> Result<CommandOutcome, ValidationError> {
        self.execute(Command::SetActiveResolutionStage(index)).await
    }

    pub async fn set_stage_resolution(
        &self,
        index: u8,
        x: u16,
        y: u16,
    ) -> Result<CommandOutcome, ValidationError> {
        self.execute(Command::SetStageResolution { index, x, y }).await
    }

    // ── Refreshes ────────────────────────────────────────────────

    /// Read battery level and charging flag.
    pub async fn refresh_battery(&self) -> Result<CommandOutcome, ValidationError> {
        let store = &self.inner.store;
        store.ready_snapshot()?;
        let observed = store.observe();
        debug!("refreshing battery");

        let device = self.inner.device.as_ref();
        let read = async {
            let level = device.battery_level().await?;
            let charging = device.is_charging().await?;
            Ok::<_, CapabilityError>((level, charging))
        };
        let (level, charging) = match read.await {
            Ok(values) => values,
            Err(err) => return Ok(self.read_failed(Attribute::Battery, err.into())),
        };
        if level > 100 {
            let err = CoreError::parse(format!(
                "batteryLevel: {}",
                ValidationError::BatteryOutOfRange(level)
            ));
            return Ok(self.read_failed(Attribute::Battery, err));
        }

        Ok(store.apply_observed(Attribute::Battery, &observed, |snap| {
            snap.battery_level = level;
            snap.is_charging = charging;
        }))
    }

    /// Read the stage table on its own and replace the local one.
    pub async fn refresh_resolution_stages(&self) -> Result<CommandOutcome, ValidationError> {
        let store = &self.inner.store;
        store.ready_snapshot()?;
        let observed = store.observe();
        debug!("refreshing resolution stages");

        let stages = match self.inner.device.resolution_stages().await {
            Ok(stages) => stages,
            Err(err) => return Ok(self.read_failed(Attribute::ResolutionStages, err.into())),
        };
        let table = match StageTable::new(stages) {
            Ok(table) => table,
            Err(e) => {
                let err = CoreError::parse(format!("dpiStages: {e}"));
                return Ok(self.read_failed(Attribute::ResolutionStages, err));
            }
        };

        Ok(store.apply_observed(Attribute::ResolutionStages, &observed, |snap| {
            snap.stages = table;
        }))
    }

    /// Run one reconciliation immediately.
    pub async fn reconcile_now(&self) -> Result<CommandOutcome, ValidationError> {
        reconcile(&self.inner).await
    }

    fn read_failed(&self, attr: Attribute, err: CoreError) -> CommandOutcome {
        warn!(attribute = %attr, error = %err, "device read failed");
        self.inner
            .store
            .record_failure(ErrorSource::Attribute(attr), err.to_string());
        CommandOutcome::Failed { error: err }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

async fn read_full(device: &dyn DeviceCapability) -> Result<DeviceSnapshot, CoreError> {
    let raw = device.read_snapshot().await?;
    parse_snapshot(&raw)
}

/// One full read merged into the store. Failures are recorded and logged
/// but never move the lifecycle out of `Ready`.
async fn reconcile(inner: &ControllerInner) -> Result<CommandOutcome, ValidationError> {
    let store = &inner.store;
    store.ready_snapshot()?;
    let observed = store.observe();

    match read_full(inner.device.as_ref()).await {
        Ok(fresh) => {
            store.merge_snapshot(&observed, fresh);
            store.mark_reconciled();
            store.clear_failure(ErrorSource::Reconcile);
            debug!("reconciled device snapshot");
            Ok(CommandOutcome::Applied)
        }
        Err(e) => {
            warn!(error = %e, "reconciliation read failed");
            store.record_failure(ErrorSource::Reconcile, e.to_string());
            Ok(CommandOutcome::Failed { error: e })
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically reconcile until cancelled or the controller is dropped.
async fn reconcile_task(
    controller: Weak<ControllerInner>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(inner) = controller.upgrade() else {
                    break;
                };
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = reconcile(&inner) => {}
                }
            }
        }
    }

    debug!("reconciliation loop exited");
}
