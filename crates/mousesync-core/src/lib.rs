//! Client-side state synchronization for configurable pointing devices.
//!
//! This crate keeps an in-memory model of a device's configuration
//! consistent with the physical device, which is reachable only through an
//! asynchronous [`DeviceCapability`] implementation:
//!
//! - **[`Controller`]**: Central facade. [`initialize()`](Controller::initialize)
//!   performs the first full read and, once the store is ready, spawns the
//!   periodic reconciliation loop. Every mutation entry point validates its
//!   input, applies an optimistic local update, calls the device and settles
//!   the outcome.
//!
//! - **[`DeviceStore`]**: Canonical [`DeviceSnapshot`] plus
//!   [`LifecycleState`] and [`ErrorState`], published through
//!   `tokio::sync::watch` channels.
//!
//! - **[`SnapshotStream`]**: Subscription handle vended by the store.
//!
//! - **[`Command`]**: Typed mutation requests. Each one expands into one or
//!   more remote writes tagged with the [`Attribute`] they touch; per-attribute
//!   generations discard results that a newer request has overtaken.
//!
//! - **Domain model** ([`model`]): snapshot, polling rate, resolution and the
//!   resolution-stage table with its single-active-stage invariant.

pub mod capability;
pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use capability::{CapabilityError, DeviceCapability};
pub use command::{Attribute, Command, CommandOutcome};
pub use config::{ControllerConfig, FailurePolicy};
pub use controller::Controller;
pub use convert::{SnapshotPayload, StagePayload, encode_snapshot, parse_snapshot};
pub use error::{CoreError, ValidationError};
pub use store::{DeviceStore, ErrorSource, ErrorState, LifecycleState};
pub use stream::{SnapshotStream, SnapshotWatchStream};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    DeviceSnapshot, IlluminationBehavior, PollingRate, Resolution, ResolutionBounds,
    ResolutionStage, RgbColor, StageDisplayMode, StageTable, TargetPlatform,
};
