//! In-flight guard for cycle actions.
//!
//! At most one mutating call per cycle may be outstanding. A handler claims a
//! slot before calling the API; the slot is released when it is dropped,
//! whether the call succeeded, failed, or the future was cancelled.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::domain::foundation::CycleId;

/// Set of cycles with an action in flight.
///
/// Shared by all action handlers of one portal session.
#[derive(Debug, Default)]
pub struct PendingActions {
    in_flight: Mutex<HashSet<CycleId>>,
}

/// Held while an action on `cycle_id` is in flight.
#[derive(Debug)]
pub struct PendingSlot<'a> {
    owner: &'a PendingActions,
    cycle_id: CycleId,
}

impl PendingActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot for a cycle, or `None` if one is already held.
    pub fn try_claim(&self, cycle_id: CycleId) -> Option<PendingSlot<'_>> {
        let mut in_flight = self.lock();
        if !in_flight.insert(cycle_id) {
            return None;
        }
        Some(PendingSlot {
            owner: self,
            cycle_id,
        })
    }

    /// True while an action on the cycle is in flight.
    pub fn is_pending(&self, cycle_id: &CycleId) -> bool {
        self.lock().contains(cycle_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<CycleId>> {
        // The set stays consistent even if a holder panicked.
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.owner.lock().remove(&self.cycle_id);
    }
}
