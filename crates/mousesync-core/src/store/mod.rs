// ── Reactive device store ──
//
// Canonical snapshot, lifecycle and error state, each published on its
// own `watch` channel.

mod device_store;
mod lifecycle;
mod refresh;

pub use device_store::DeviceStore;
pub use lifecycle::{ErrorSource, ErrorState, LifecycleState};

pub(crate) use refresh::{Observation, Ticket};
