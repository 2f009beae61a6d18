// ABOUTME: Service startup ordering: everything at once, or infra-critical first.
// ABOUTME: Apply failures and health timeouts are recorded; startup itself never fails.

use super::health::{HealthOutcome, HealthPolicy, wait_until_ready};
use crate::diagnostics::{Diagnostics, Warning};
use crate::manifest::{ApplyRequest, DeploymentManifest, ManifestApplier};
use crate::runtime::ContainerOps;
use crate::types::{ContainerName, ServiceName, Slot};
use serde::Serialize;

/// How services are brought up.
#[derive(Debug, Clone, Copy)]
pub struct StartupPlan<'p> {
    pub parallel: bool,
    /// Operator-selected subset. Empty means the whole manifest.
    pub selected: &'p [ServiceName],
    pub infra_critical: &'p [ServiceName],
    pub container_prefix: &'p str,
    pub health: HealthPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupMode {
    Parallel,
    Staged,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartupReport {
    pub mode: StartupMode,
    /// Infra-critical services started and polled before the rest.
    pub gated: Vec<String>,
    pub gate: HealthOutcome,
    /// Readiness of everything started in this run.
    pub ready: HealthOutcome,
    pub apply_errors: Vec<String>,
}

impl StartupReport {
    /// Started cleanly and every service became ready.
    pub fn is_healthy(&self) -> bool {
        self.apply_errors.is_empty() && self.ready.is_ready()
    }
}

pub(crate) async fn start_services<R: ContainerOps + ?Sized>(
    runtime: &R,
    applier: &dyn ManifestApplier,
    manifest: &DeploymentManifest,
    slot: Slot,
    plan: &StartupPlan<'_>,
    diag: &mut Diagnostics,
) -> StartupReport {
    let subset = !plan.selected.is_empty();
    let mut apply_errors = Vec::new();

    let (mode, gated, gate) = if plan.parallel {
        (StartupMode::Parallel, Vec::new(), HealthOutcome::Skipped)
    } else {
        let infra: Vec<&ServiceName> = manifest
            .present(plan.infra_critical)
            .into_iter()
            .filter(|s| !subset || plan.selected.contains(s))
            .collect();
        let gate = if infra.is_empty() {
            HealthOutcome::Skipped
        } else {
            tracing::info!("starting infra-critical services first: {}", join(&infra));
            let request = ApplyRequest {
                manifest,
                slot,
                services: infra.clone(),
                remove_orphans: false,
            };
            apply(applier, &request, &mut apply_errors, diag).await;
            let containers: Vec<ContainerName> = infra
                .iter()
                .map(|s| s.slot_container(plan.container_prefix, slot))
                .collect();
            wait_until_ready(runtime, &containers, plan.health, diag).await
        };
        let gated = infra.iter().map(|s| s.to_string()).collect();
        (StartupMode::Staged, gated, gate)
    };

    // Remaining services. A full run also removes orphans; an operator-chosen
    // subset must not delete services left out of this run.
    let rest: Vec<&ServiceName> = plan
        .selected
        .iter()
        .filter(|s| !gated.contains(&s.to_string()))
        .collect();
    if !subset || !rest.is_empty() {
        let request = ApplyRequest {
            manifest,
            slot,
            services: rest,
            remove_orphans: !subset,
        };
        apply(applier, &request, &mut apply_errors, diag).await;
    }

    let names: Vec<String> = if subset {
        plan.selected.iter().map(|s| s.to_string()).collect()
    } else {
        manifest.services().to_vec()
    };
    let containers: Vec<ContainerName> = names
        .iter()
        .map(|s| ContainerName::new(format!("{}{}", slot.container_prefix(plan.container_prefix), s)))
        .collect();
    let ready = wait_until_ready(runtime, &containers, plan.health, diag).await;

    StartupReport {
        mode,
        gated,
        gate,
        ready,
        apply_errors,
    }
}

async fn apply(
    applier: &dyn ManifestApplier,
    request: &ApplyRequest<'_>,
    errors: &mut Vec<String>,
    diag: &mut Diagnostics,
) {
    match applier.apply(request).await {
        Ok(()) => tracing::info!(
            "applied {} to slot {}",
            if request.services.is_empty() {
                "full manifest".to_string()
            } else {
                join(&request.services)
            },
            request.slot
        ),
        Err(e) => {
            diag.warn(Warning::startup(e.to_string()));
            errors.push(e.to_string());
        }
    }
}

fn join(services: &[&ServiceName]) -> String {
    services
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::WarningKind;
    use crate::manifest::fake::{AppliedCall, RecordingApplier};
    use crate::runtime::fake::FakeEngine;
    use std::path::Path;
    use std::time::Duration;

    fn manifest() -> DeploymentManifest {
        DeploymentManifest::parse(
            Path::new("docker-compose.yml"),
            "services:\n  adguard: {}\n  unbound: {}\n  memos: {}\n  portainer: {}\n",
        )
        .unwrap()
    }

    fn services(names: &[&str]) -> Vec<ServiceName> {
        names.iter().map(|n| ServiceName::new(n).unwrap()).collect()
    }

    fn plan<'p>(
        parallel: bool,
        selected: &'p [ServiceName],
        infra: &'p [ServiceName],
    ) -> StartupPlan<'p> {
        StartupPlan {
            parallel,
            selected,
            infra_critical: infra,
            container_prefix: "dhi",
            health: HealthPolicy {
                ticks: 2,
                interval: Duration::from_millis(1),
            },
        }
    }

    fn call(slot: Slot, services: &[&str], remove_orphans: bool) -> AppliedCall {
        AppliedCall {
            slot,
            services: services.iter().map(|s| s.to_string()).collect(),
            remove_orphans,
        }
    }

    #[tokio::test]
    async fn parallel_applies_everything_once() {
        let engine = FakeEngine::new();
        let applier = RecordingApplier::new(&engine, "dhi");
        let infra = services(&["adguard"]);
        let mut diag = Diagnostics::default();

        let report = start_services(
            &engine,
            &applier,
            &manifest(),
            Slot::B,
            &plan(true, &[], &infra),
            &mut diag,
        )
        .await;

        assert_eq!(report.mode, StartupMode::Parallel);
        assert_eq!(report.gate, HealthOutcome::Skipped);
        assert!(report.is_healthy());
        assert_eq!(
            applier.calls(),
            vec![call(Slot::B, &["adguard", "unbound", "memos", "portainer"], true)]
        );
    }

    #[tokio::test]
    async fn staged_starts_infra_present_in_manifest_first() {
        let engine = FakeEngine::new();
        let applier = RecordingApplier::new(&engine, "dhi");
        let infra = services(&["unbound", "wireguard", "adguard"]);
        let mut diag = Diagnostics::default();

        let report = start_services(
            &engine,
            &applier,
            &manifest(),
            Slot::A,
            &plan(false, &[], &infra),
            &mut diag,
        )
        .await;

        assert_eq!(report.mode, StartupMode::Staged);
        assert_eq!(report.gated, vec!["unbound", "adguard"]);
        assert_eq!(report.gate, HealthOutcome::Ready { ticks: 1 });
        let calls = applier.calls();
        assert_eq!(calls[0], call(Slot::A, &["unbound", "adguard"], false));
        assert_eq!(
            calls[1],
            call(Slot::A, &["adguard", "unbound", "memos", "portainer"], true)
        );
        assert!(engine.container_names().contains(&"dhi-a-memos".to_string()));
    }

    #[tokio::test]
    async fn selected_subset_never_removes_orphans() {
        let engine = FakeEngine::new();
        let applier = RecordingApplier::new(&engine, "dhi");
        let infra = services(&["adguard", "unbound"]);
        let selected = services(&["adguard", "memos"]);
        let mut diag = Diagnostics::default();

        let report = start_services(
            &engine,
            &applier,
            &manifest(),
            Slot::A,
            &plan(false, &selected, &infra),
            &mut diag,
        )
        .await;

        assert_eq!(report.gated, vec!["adguard"]);
        assert_eq!(
            applier.calls(),
            vec![
                call(Slot::A, &["adguard"], false),
                call(Slot::A, &["memos"], false),
            ]
        );
        assert!(!engine.container_names().contains(&"dhi-a-unbound".to_string()));
    }

    #[tokio::test]
    async fn gate_timeout_warns_and_still_starts_the_rest() {
        let engine = FakeEngine::new();
        let applier = RecordingApplier::new(&engine, "dhi").stuck("adguard");
        let infra = services(&["adguard"]);
        let mut diag = Diagnostics::default();

        let report = start_services(
            &engine,
            &applier,
            &manifest(),
            Slot::A,
            &plan(false, &[], &infra),
            &mut diag,
        )
        .await;

        assert!(matches!(report.gate, HealthOutcome::TimedOut { .. }));
        assert_eq!(applier.calls().len(), 2);
        assert!(!report.is_healthy());
        assert_eq!(diag.count(WarningKind::HealthTimeout), 2);
    }

    #[tokio::test]
    async fn apply_failure_is_recorded() {
        let engine = FakeEngine::new();
        let applier = RecordingApplier::failing(&engine, "dhi");
        let mut diag = Diagnostics::default();

        let report = start_services(
            &engine,
            &applier,
            &manifest(),
            Slot::A,
            &plan(true, &[], &[]),
            &mut diag,
        )
        .await;

        assert_eq!(report.apply_errors.len(), 1);
        assert!(!report.is_healthy());
        assert_eq!(diag.count(WarningKind::Startup), 1);
    }
}
