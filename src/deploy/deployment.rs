// ABOUTME: Deployment run parameterized by its stage marker.
// ABOUTME: The pending swap travels with the run until finalize consumes it.

use super::state::{Completed, Planned, Provisioned, Started};
use crate::cleanup::CleanupReport;
use crate::slot::{PendingSwap, SlotError, SlotManager};
use crate::types::Slot;
use chrono::{DateTime, Utc};

/// A deployment in progress, parameterized by its current stage.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) target: Slot,
    pub(crate) swap: Option<PendingSwap>,
    pub(crate) cleanup: Option<CleanupReport>,
    pub(crate) state: S,
}

impl Deployment<Planned> {
    /// Choose the target slot. With `swap`, back up and prepare the other slot;
    /// otherwise redeploy into the active one.
    pub fn plan(slots: &SlotManager, swap: bool, now: DateTime<Utc>) -> Result<Self, SlotError> {
        let (target, swap) = if swap {
            let pending = slots.swap_slots(now)?;
            (pending.target(), Some(pending))
        } else {
            (slots.active(), None)
        };
        tracing::info!(
            "deploying into slot {target}{}",
            if swap.is_some() { " (swap)" } else { "" }
        );
        Ok(Deployment {
            target,
            swap,
            cleanup: None,
            state: Planned,
        })
    }
}

impl<S> Deployment<S> {
    pub fn target(&self) -> Slot {
        self.target
    }

    pub fn is_swap(&self) -> bool {
        self.swap.is_some()
    }

    pub fn cleanup_report(&self) -> Option<&CleanupReport> {
        self.cleanup.as_ref()
    }

    pub(crate) fn advance<T>(self, state: T) -> Deployment<T> {
        Deployment {
            target: self.target,
            swap: self.swap,
            cleanup: self.cleanup,
            state,
        }
    }
}

impl Deployment<Provisioned> {
    pub fn tls(&self) -> &crate::cert::TlsOutcome {
        &self.state.tls
    }
}

impl Deployment<Started> {
    pub fn startup(&self) -> &super::StartupReport {
        &self.state.startup
    }
}

impl Deployment<Completed> {
    /// Slot that is active once the run is over.
    pub fn active(&self) -> Slot {
        self.state.active
    }
}
