// ABOUTME: Stage transitions of a deployment run.
// ABOUTME: Each method consumes self and returns the next stage.

use super::Deployment;
use super::error::DeployError;
use super::probe::{Reachability, probe};
use super::report::DeployReport;
use super::startup::{StartupPlan, start_services};
use super::state::{Completed, Planned, Provisioned, Started};
use crate::cert::CertificateIssuer;
use crate::cleanup::CleanupOrchestrator;
use crate::diagnostics::{Diagnostics, Warning};
use crate::manifest::{DeploymentManifest, ManifestApplier};
use crate::runtime::{ContainerOps, FullRuntime};
use crate::slot::SlotManager;
use crate::types::ServiceName;
use chrono::{DateTime, Utc};
use std::time::Duration;

// =============================================================================
// Planned
// =============================================================================

impl Deployment<Planned> {
    /// Remove the targeted services' containers before starting them again.
    ///
    /// Skipped on a swap: the active slot keeps serving until finalize.
    pub async fn clean<R: FullRuntime>(
        mut self,
        cleanup: &CleanupOrchestrator<'_, R>,
        targets: &[ServiceName],
        diag: &mut Diagnostics,
        now: DateTime<Utc>,
    ) -> Result<Self, DeployError> {
        if self.is_swap() {
            tracing::info!("swap in progress, leaving slot {} running", self.target.other());
            return Ok(self);
        }
        let report = cleanup.clean_selected(targets, false, diag, now).await?;
        self.cleanup = Some(report);
        Ok(self)
    }

    /// Make sure usable TLS material exists. Only a fatal issuer error stops the run.
    pub async fn provision_tls(
        self,
        issuer: &CertificateIssuer<'_>,
        diag: &mut Diagnostics,
        now: DateTime<Utc>,
    ) -> Result<Deployment<Provisioned>, DeployError> {
        let tls = issuer.run(diag, now).await.inspect_err(|e| {
            tracing::error!("no TLS material could be produced: {e}");
        })?;
        Ok(self.advance(Provisioned { tls }))
    }
}

// =============================================================================
// Provisioned -> Started
// =============================================================================

impl Deployment<Provisioned> {
    pub async fn start<R: ContainerOps + ?Sized>(
        self,
        runtime: &R,
        applier: &dyn ManifestApplier,
        manifest: &DeploymentManifest,
        plan: &StartupPlan<'_>,
        diag: &mut Diagnostics,
    ) -> Deployment<Started> {
        let startup = start_services(runtime, applier, manifest, self.target, plan, diag).await;
        let Deployment {
            target,
            swap,
            cleanup,
            state: Provisioned { tls },
        } = self;
        Deployment {
            target,
            swap,
            cleanup,
            state: Started { tls, startup },
        }
    }
}

// =============================================================================
// Started -> Completed
// =============================================================================

impl Deployment<Started> {
    /// Persist a pending swap once the new slot is healthy, then retire the old slot.
    ///
    /// An unhealthy swap is abandoned: the durable pointer stays where it was.
    pub async fn finalize<R: ContainerOps + ?Sized>(
        self,
        slots: &mut SlotManager,
        runtime: &R,
        diag: &mut Diagnostics,
    ) -> Result<Deployment<Completed>, DeployError> {
        let Deployment {
            target,
            swap,
            cleanup,
            state: Started { tls, startup },
        } = self;
        let mut retired = Vec::new();
        let mut swapped = false;

        if let Some(pending) = swap {
            if startup.is_healthy() {
                let active = slots.finalize_swap(pending)?;
                tracing::info!("slot {active} is now active");
                swapped = true;
                retired = slots
                    .stop_inactive_slot(runtime, diag)
                    .await
                    .iter()
                    .map(|n| n.to_string())
                    .collect();
            } else {
                diag.warn(Warning::slot(format!(
                    "slot {} not activated because its services are not ready; slot {} stays active",
                    pending.target(),
                    pending.from()
                )));
            }
        }

        Ok(Deployment {
            target,
            swap: None,
            cleanup,
            state: Completed {
                tls,
                startup,
                active: slots.active(),
                swapped,
                retired,
            },
        })
    }
}

// =============================================================================
// Completed
// =============================================================================

impl Deployment<Completed> {
    /// Probe the control surface and produce the final report.
    pub async fn verify(self, control_url: Option<&str>, timeout: Duration) -> DeployReport {
        let reachability: Reachability = probe(control_url, timeout).await;
        let Completed {
            tls,
            startup,
            active,
            swapped,
            retired,
        } = self.state;
        DeployReport {
            slot: active,
            target: self.target,
            swapped,
            tls,
            cleanup: self.cleanup,
            startup,
            retired,
            reachability,
        }
    }
}
