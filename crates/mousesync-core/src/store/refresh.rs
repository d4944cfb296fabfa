// ── Optimistic writes, settlement and reconciliation merge ──
//
// Every request for an attribute is issued a generation. Only the result
// of the newest generation may touch shared state; older results are
// reported as superseded. While any request for an attribute is
// outstanding, full reads keep the local (optimistic) value for it.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tracing::debug;

use super::DeviceStore;
use super::lifecycle::ErrorSource;
use crate::capability::CapabilityError;
use crate::command::{Attribute, CommandOutcome, RemoteWrite};
use crate::config::FailurePolicy;
use crate::error::{CoreError, ValidationError};
use crate::model::DeviceSnapshot;

#[derive(Debug, Default)]
pub(crate) struct InFlight {
    issued: HashMap<Attribute, u64>,
    pending: HashMap<Attribute, usize>,
}

impl InFlight {
    fn issue(&mut self, attr: Attribute) -> u64 {
        let generation = self.issued.entry(attr).or_insert(0);
        *generation += 1;
        *self.pending.entry(attr).or_insert(0) += 1;
        *generation
    }

    fn complete(&mut self, attr: Attribute) {
        if let Some(count) = self.pending.get_mut(&attr) {
            *count = count.saturating_sub(1);
        }
    }

    fn generation(&self, attr: Attribute) -> u64 {
        self.issued.get(&attr).copied().unwrap_or(0)
    }

    fn is_pending(&self, attr: Attribute) -> bool {
        self.pending.get(&attr).is_some_and(|count| *count > 0)
    }
}

/// Receipt for an optimistic update, redeemed by [`DeviceStore::settle`].
///
/// Dropping an unsettled ticket (the dispatching future was cancelled
/// mid-call) still completes its generations, so the attributes stop
/// counting as pending and reconciliation can correct them.
#[derive(Debug)]
pub(crate) struct Ticket {
    store: Weak<DeviceStore>,
    previous: Arc<DeviceSnapshot>,
    generations: Vec<(Attribute, u64)>,
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if self.generations.is_empty() {
            return;
        }
        let Some(store) = self.store.upgrade() else {
            return;
        };
        let mut in_flight = store.lock_in_flight();
        for (attr, _) in &self.generations {
            in_flight.complete(*attr);
        }
        debug!(attributes = self.generations.len(), "dispatch abandoned before settling");
    }
}

/// Generations seen when a read started, so the result can tell whether
/// a write was issued while the read was outstanding.
#[derive(Debug, Clone)]
pub(crate) struct Observation {
    generations: HashMap<Attribute, u64>,
}

impl DeviceStore {
    /// Plan against the current snapshot and apply the resulting writes
    /// locally as one update, issuing a generation for every attribute they
    /// touch. Planning runs under the in-flight lock so it always sees the
    /// snapshot the writes are applied to.
    pub(crate) fn apply_optimistic<F>(
        self: &Arc<Self>,
        plan: F,
    ) -> Result<(Ticket, Vec<RemoteWrite>), ValidationError>
    where
        F: FnOnce(&DeviceSnapshot) -> Result<Vec<RemoteWrite>, ValidationError>,
    {
        let mut in_flight = self.lock_in_flight();
        let previous = self.ready_snapshot()?;
        let writes = plan(&previous)?;

        let mut next = DeviceSnapshot::clone(&previous);
        let mut generations: Vec<(Attribute, u64)> = Vec::with_capacity(writes.len());
        for write in &writes {
            write.apply(&mut next);
            let attr = write.attribute();
            if !generations.iter().any(|(a, _)| *a == attr) {
                generations.push((attr, in_flight.issue(attr)));
            }
        }

        self.snapshot.send_replace(Some(Arc::new(next)));
        let ticket = Ticket {
            store: Arc::downgrade(self),
            previous,
            generations,
        };
        Ok((ticket, writes))
    }

    /// Settle a dispatched command.
    ///
    /// `accepted` lists the attributes whose writes the device confirmed.
    /// `failure` names the write that failed, if any; writes after it were
    /// never sent. Rollback only touches attributes the device did not
    /// accept.
    pub(crate) fn settle(
        &self,
        mut ticket: Ticket,
        accepted: &[Attribute],
        failure: Option<(Attribute, CapabilityError)>,
        policy: FailurePolicy,
    ) -> CommandOutcome {
        let generations = std::mem::take(&mut ticket.generations);
        let mut in_flight = self.lock_in_flight();
        let mut latest: Vec<Attribute> = Vec::with_capacity(generations.len());
        for (attr, generation) in &generations {
            in_flight.complete(*attr);
            if in_flight.generation(*attr) == *generation {
                latest.push(*attr);
            }
        }

        let Some((failed_attr, err)) = failure else {
            for attr in &latest {
                self.clear_failure(ErrorSource::Attribute(*attr));
            }
            return if latest.len() == generations.len() {
                CommandOutcome::Applied
            } else {
                CommandOutcome::Superseded
            };
        };

        if !latest.contains(&failed_attr) {
            debug!(attribute = %failed_attr, "discarding failure of superseded request");
            return CommandOutcome::Superseded;
        }

        for attr in latest.iter().filter(|a| accepted.contains(a)) {
            self.clear_failure(ErrorSource::Attribute(*attr));
        }
        let error = CoreError::from(err);
        self.record_failure(ErrorSource::Attribute(failed_attr), error.to_string());

        if policy == FailurePolicy::Rollback {
            let unconfirmed: Vec<Attribute> = latest
                .into_iter()
                .filter(|a| !accepted.contains(a))
                .collect();
            self.snapshot.send_if_modified(|current| {
                let Some(snap) = current else {
                    return false;
                };
                let mut restored = DeviceSnapshot::clone(snap);
                for attr in &unconfirmed {
                    attr.transfer(&ticket.previous, &mut restored);
                }
                *current = Some(Arc::new(restored));
                true
            });
        }

        CommandOutcome::Failed { error }
    }

    /// Record the generations in effect as a read begins.
    pub(crate) fn observe(&self) -> Observation {
        let in_flight = self.lock_in_flight();
        Observation {
            generations: in_flight.issued.clone(),
        }
    }

    /// Merge a fresh full read into the snapshot.
    ///
    /// Attributes with an outstanding request, or whose generation moved
    /// while the read was in progress, keep their local value.
    pub(crate) fn merge_snapshot(&self, observed: &Observation, mut fresh: DeviceSnapshot) {
        let in_flight = self.lock_in_flight();
        let Some(local) = self.snapshot() else {
            self.snapshot.send_replace(Some(Arc::new(fresh)));
            return;
        };

        for (attr, generation) in &in_flight.issued {
            let moved = observed.generations.get(attr).copied().unwrap_or(0) != *generation;
            if moved || in_flight.is_pending(*attr) {
                attr.transfer(&local, &mut fresh);
            }
        }

        self.snapshot.send_if_modified(|current| {
            if current.as_deref() == Some(&fresh) {
                false
            } else {
                *current = Some(Arc::new(fresh));
                true
            }
        });
    }

    /// Apply a single-attribute read if nothing was issued for `attr`
    /// since `observed` and no request for it is outstanding.
    pub(crate) fn apply_observed(
        &self,
        attr: Attribute,
        observed: &Observation,
        update: impl FnOnce(&mut DeviceSnapshot),
    ) -> CommandOutcome {
        let in_flight = self.lock_in_flight();
        let before = observed.generations.get(&attr).copied().unwrap_or(0);
        if in_flight.generation(attr) != before || in_flight.is_pending(attr) {
            return CommandOutcome::Superseded;
        }

        self.snapshot.send_if_modified(|current| {
            let Some(snap) = current else {
                return false;
            };
            let mut next = DeviceSnapshot::clone(snap);
            update(&mut next);
            if next == **snap {
                return false;
            }
            *current = Some(Arc::new(next));
            true
        });
        self.clear_failure(ErrorSource::Attribute(attr));
        CommandOutcome::Applied
    }
}
