// ABOUTME: SlotManager: computes swap targets, persists the pointer, retires the old slot.
// ABOUTME: A PendingSwap changes nothing durable until finalize_swap consumes it.

use super::backup::{BackupSpec, create_backup};
use super::store::SlotStore;
use super::SlotError;
use crate::diagnostics::{Diagnostics, Warning};
use crate::runtime::{ContainerFilters, ContainerOps, TolerateAbsent};
use crate::types::{ContainerName, Slot};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// A swap that has been prepared but not persisted.
///
/// Dropping it leaves the durable pointer where it was.
#[must_use = "a swap only takes effect once finalize_swap persists it"]
#[derive(Debug)]
pub struct PendingSwap {
    from: Slot,
    to: Slot,
    backup: PathBuf,
}

impl PendingSwap {
    pub fn from(&self) -> Slot {
        self.from
    }

    pub fn target(&self) -> Slot {
        self.to
    }

    /// Archive written before the swap.
    pub fn backup(&self) -> &Path {
        &self.backup
    }
}

#[derive(Debug)]
pub struct SlotManager {
    store: SlotStore,
    active: Slot,
    backup: BackupSpec,
    container_prefix: String,
}

impl SlotManager {
    /// Read the durable pointer once.
    pub fn open(
        store: SlotStore,
        backup: BackupSpec,
        container_prefix: impl Into<String>,
    ) -> Result<Self, SlotError> {
        let active = store.load()?;
        Ok(Self {
            store,
            active,
            backup,
            container_prefix: container_prefix.into(),
        })
    }

    pub fn active(&self) -> Slot {
        self.active
    }

    pub fn inactive(&self) -> Slot {
        self.active.other()
    }

    pub fn container_prefix(&self) -> &str {
        &self.container_prefix
    }

    /// Back up config and secrets, then hand out the other slot as target.
    pub fn swap_slots(&self, now: DateTime<Utc>) -> Result<PendingSwap, SlotError> {
        let to = self.active.other();
        let backup = create_backup(&self.backup, self.active, to, now)?;
        tracing::info!("swap prepared: {} -> {}", self.active, to);
        Ok(PendingSwap {
            from: self.active,
            to,
            backup,
        })
    }

    /// Persist the swap. Call only once the target's services are healthy.
    pub fn finalize_swap(&mut self, pending: PendingSwap) -> Result<Slot, SlotError> {
        self.store.save(pending.to)?;
        self.active = pending.to;
        Ok(self.active)
    }

    /// Force-remove every container carrying the inactive slot's prefix.
    ///
    /// Best effort: failures become warnings. Returns the names removed.
    pub async fn stop_inactive_slot<R: ContainerOps + ?Sized>(
        &self,
        runtime: &R,
        diag: &mut Diagnostics,
    ) -> Vec<ContainerName> {
        let prefix = self.inactive().container_prefix(&self.container_prefix);
        let containers = match runtime
            .list_containers(&ContainerFilters::name_contains(prefix.clone()))
            .await
        {
            Ok(c) => c,
            Err(e) => {
                diag.warn(Warning::slot(format!(
                    "cannot list slot {} containers: {e}",
                    self.inactive()
                )));
                return Vec::new();
            }
        };

        let mut removed = Vec::new();
        for container in containers
            .into_iter()
            .filter(|c| c.name.as_str().starts_with(&prefix))
        {
            match runtime
                .remove_container(&container.name, true)
                .await
                .tolerate_absent()
            {
                Ok(_) => removed.push(container.name),
                Err(e) => diag.warn(Warning::slot(format!(
                    "failed to remove {}: {e}",
                    container.name
                ))),
            }
        }
        tracing::info!(
            "removed {} container(s) of inactive slot {}",
            removed.len(),
            self.inactive()
        );
        removed
    }
}
