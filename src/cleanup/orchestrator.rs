// ABOUTME: Selective cleanup and the nine-phase full revert.
// ABOUTME: Every phase tolerates absent resources; only a "no" answer halts the sequence.

use super::report::{CertificateOutcome, CleanupReport, Phase, PhaseReport};
use super::rules::{MatchRule, RuleSet};
use crate::cert::{self, CertificateStore, PreservedCertificate};
use crate::diagnostics::{Diagnostics, Warning};
use crate::firewall::{self, Firewall, FirewallRule};
use crate::prompt::{PromptError, Prompter};
use crate::runtime::{
    ContainerError, ContainerFilters, ContainerState, FullRuntime, ImageFilters, Removal,
    ResourceKind, TolerateAbsent,
};
use crate::schedule::{self, TaskScheduler};
use crate::types::{ContainerName, NetworkName, ServiceName, Slot, VolumeName};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("aborted by operator")]
    UserAborted,

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Everything cleanup needs to know about this deployment's resources.
#[derive(Debug, Clone)]
pub struct CleanupPlan {
    /// Display name used in confirmations.
    pub app_name: String,
    /// All services the deployment knows about.
    pub services: Vec<ServiceName>,
    pub container_prefix: String,
    /// Containers outside the service list that still belong to us.
    pub extra_containers: Vec<MatchRule>,
    pub volumes: RuleSet,
    pub networks: RuleSet,
    /// Image references pulled for this deployment.
    pub images: Vec<String>,
    pub data_dir: PathBuf,
    /// Directories and files revert deletes.
    pub state_paths: Vec<PathBuf>,
    pub schedule_marker: String,
    pub firewall_rules: Vec<FirewallRule>,
    /// Domain the deployment was configured for, from the secrets file.
    pub domain: Option<String>,
    pub stop_timeout: Duration,
}

impl CleanupPlan {
    fn known_containers(&self) -> RuleSet {
        let mut rules = RuleSet::for_service_containers(&self.services, &self.container_prefix);
        for slot in [Slot::A, Slot::B] {
            rules = rules.with_rule(MatchRule::Prefixed(slot.container_prefix(&self.container_prefix)));
        }
        for extra in &self.extra_containers {
            rules = rules.with_rule(extra.clone());
        }
        rules
    }
}

/// The certificate held across a directory wipe.
struct CertificateGuard<'s> {
    held: PreservedCertificate<'s>,
    outcome: CertificateOutcome,
}

/// Sequences destructive teardown against the engine, the filesystem, and the host.
pub struct CleanupOrchestrator<'a, R: FullRuntime> {
    runtime: &'a R,
    certs: &'a CertificateStore,
    scheduler: &'a dyn TaskScheduler,
    firewall: &'a dyn Firewall,
    prompter: &'a dyn Prompter,
    plan: &'a CleanupPlan,
}

impl<'a, R: FullRuntime> CleanupOrchestrator<'a, R> {
    pub fn new(
        runtime: &'a R,
        certs: &'a CertificateStore,
        scheduler: &'a dyn TaskScheduler,
        firewall: &'a dyn Firewall,
        prompter: &'a dyn Prompter,
        plan: &'a CleanupPlan,
    ) -> Self {
        Self {
            runtime,
            certs,
            scheduler,
            firewall,
            prompter,
            plan,
        }
    }

    /// Remove the containers of `targets`, the deployment's networks, and
    /// optionally the data directory.
    pub async fn clean_selected(
        &self,
        targets: &[ServiceName],
        wipe_data: bool,
        diag: &mut Diagnostics,
        now: DateTime<Utc>,
    ) -> Result<CleanupReport, CleanupError> {
        let mut report = CleanupReport::default();
        let rules = RuleSet::for_service_containers(targets, &self.plan.container_prefix);
        let (containers, listed) = self.matching_containers(&rules).await;

        if !containers.is_empty() {
            let names: Vec<&str> = containers.iter().map(|(n, _)| n.as_str()).collect();
            let question = format!(
                "Remove {} existing container(s): {}?",
                names.len(),
                names.join(", ")
            );
            if !self.prompter.confirm(&question, true)? {
                tracing::error!("cleanup aborted by operator");
                return Err(CleanupError::UserAborted);
            }
        }

        let mut phase = self.remove_containers(&containers).await;
        if let Err(e) = listed {
            phase.fail("container list", e);
        }
        report.push(phase, diag);
        report.push(self.remove_networks().await, diag);

        if wipe_data && self.plan.data_dir.exists() {
            let dirs = [self.plan.data_dir.clone()];
            let (guard, protected) = self.guard_certificate(&dirs, diag, now).await?;
            let mut phase = self
                .delete_paths(Phase::WipeData, &dirs, protected.as_deref())
                .await;
            if let Err(e) = tokio::fs::create_dir_all(&self.plan.data_dir).await {
                phase.fail(self.plan.data_dir.display().to_string(), e);
            }
            report.push(phase, diag);
            report.certificate = self.release(guard, diag);
        }

        Ok(report)
    }

    /// Dismantle everything this deployment created, in nine ordered phases.
    pub async fn revert(
        &self,
        diag: &mut Diagnostics,
        now: DateTime<Utc>,
    ) -> Result<CleanupReport, CleanupError> {
        let question = format!(
            "Revert {}: remove all of its containers, volumes, networks, images, and state?",
            self.plan.app_name
        );
        if !self.prompter.confirm(&question, true)? {
            tracing::error!("revert aborted by operator");
            return Err(CleanupError::UserAborted);
        }

        let mut report = CleanupReport::default();
        let known = self.plan.known_containers();

        let (containers, listed) = self.matching_containers(&known).await;
        let mut phase = self.stop_containers(&containers).await;
        if let Err(e) = listed {
            phase.fail("container list", e);
        }
        report.push(phase, diag);

        // Re-list: stopping can let auto-remove containers disappear.
        let (containers, listed) = self.matching_containers(&known).await;
        let mut phase = self.remove_containers(&containers).await;
        if let Err(e) = listed {
            phase.fail("container list", e);
        }
        report.push(phase, diag);

        report.push(self.remove_volumes().await, diag);
        report.push(self.remove_networks().await, diag);
        report.push(self.remove_images().await, diag);

        let (guard, protected) = self
            .guard_certificate(&self.plan.state_paths, diag, now)
            .await?;
        report.push(
            self.delete_paths(Phase::RemoveState, &self.plan.state_paths, protected.as_deref())
                .await,
            diag,
        );

        report.push(self.remove_scheduled_tasks().await, diag);
        report.push(self.prune_engine().await, diag);
        report.push(self.remove_firewall_rules().await, diag);

        report.certificate = self.release(guard, diag);
        tracing::info!(
            done = report.done_count(),
            failed = report.failure_count(),
            "revert finished"
        );
        Ok(report)
    }

    async fn matching_containers(
        &self,
        rules: &RuleSet,
    ) -> (Vec<(ContainerName, ContainerState)>, Result<(), ContainerError>) {
        match self
            .runtime
            .list_containers(&ContainerFilters::everything())
            .await
        {
            Ok(all) => (
                all.into_iter()
                    .filter(|c| rules.matches(c.name.as_str()))
                    .map(|c| (c.name, c.state))
                    .collect(),
                Ok(()),
            ),
            Err(e) => (Vec::new(), Err(e)),
        }
    }

    async fn stop_containers(&self, containers: &[(ContainerName, ContainerState)]) -> PhaseReport {
        let mut phase = PhaseReport::new(Phase::StopContainers);
        for (name, state) in containers {
            if !matches!(
                state,
                ContainerState::Running | ContainerState::Restarting | ContainerState::Paused
            ) {
                phase.already_absent.push(name.to_string());
                continue;
            }
            let result = match self
                .runtime
                .stop_container(name, self.plan.stop_timeout)
                .await
            {
                Ok(()) => Ok(Removal::Removed),
                Err(ContainerError::NotRunning(_)) | Err(ContainerError::NotFound(_)) => {
                    Ok(Removal::AlreadyAbsent)
                }
                Err(e) => Err(e),
            };
            phase.record(name.as_str(), result);
        }
        phase
    }

    async fn remove_containers(&self, containers: &[(ContainerName, ContainerState)]) -> PhaseReport {
        let mut phase = PhaseReport::new(Phase::RemoveContainers);
        for (name, _) in containers {
            let result = self
                .runtime
                .remove_container(name, true)
                .await
                .tolerate_absent();
            phase.record(name.as_str(), result);
        }
        phase
    }

    async fn remove_volumes(&self) -> PhaseReport {
        let mut phase = PhaseReport::new(Phase::RemoveVolumes);
        let volumes = match self.runtime.list_volumes().await {
            Ok(v) => v,
            Err(e) => {
                phase.fail("volume list", e);
                return phase;
            }
        };
        let targets: Vec<VolumeName> = volumes
            .into_iter()
            .filter(|v| self.plan.volumes.matches(v.as_str()))
            .collect();
        for volume in &targets {
            let result = self
                .runtime
                .remove_volume(volume, true)
                .await
                .tolerate_absent();
            phase.record(volume.as_str(), result);
        }
        phase
    }

    async fn remove_networks(&self) -> PhaseReport {
        let mut phase = PhaseReport::new(Phase::RemoveNetworks);
        let networks = match self.runtime.list_networks().await {
            Ok(n) => n,
            Err(e) => {
                phase.fail("network list", e);
                return phase;
            }
        };
        let targets: Vec<NetworkName> = networks
            .into_iter()
            .filter(|n| self.plan.networks.matches(n.as_str()))
            .collect();
        for network in &targets {
            let result = self.runtime.remove_network(network).await.tolerate_absent();
            phase.record(network.as_str(), result);
        }
        phase
    }

    async fn remove_images(&self) -> PhaseReport {
        let mut phase = PhaseReport::new(Phase::RemoveImages);

        for reference in &self.plan.images {
            let filters = ImageFilters {
                reference: Some(reference.clone()),
                ..Default::default()
            };
            match self.runtime.list_images(&filters).await {
                Ok(images) if images.is_empty() => phase.already_absent.push(reference.clone()),
                Ok(images) => {
                    for image in images {
                        let result = self
                            .runtime
                            .remove_image(&image.id, true)
                            .await
                            .tolerate_absent();
                        phase.record(reference.as_str(), result);
                    }
                }
                Err(e) => phase.fail(reference.as_str(), e),
            }
        }

        let dangling = ImageFilters {
            dangling: true,
            ..Default::default()
        };
        match self.runtime.list_images(&dangling).await {
            Ok(images) => {
                for image in images {
                    let result = self
                        .runtime
                        .remove_image(&image.id, false)
                        .await
                        .tolerate_absent();
                    phase.record(image.id.as_str(), result);
                }
            }
            Err(e) => phase.fail("dangling images", e),
        }
        phase
    }

    async fn remove_scheduled_tasks(&self) -> PhaseReport {
        let mut phase = PhaseReport::new(Phase::RemoveScheduledTasks);
        let marker = &self.plan.schedule_marker;
        match schedule::remove_marked(self.scheduler, marker).await {
            Ok(0) => phase.already_absent.push(marker.clone()),
            Ok(n) => phase.done.push(format!("{n} entries marked {marker}")),
            Err(e) => phase.fail(marker.as_str(), e),
        }
        phase
    }

    async fn prune_engine(&self) -> PhaseReport {
        let mut phase = PhaseReport::new(Phase::PruneEngine);
        for kind in [ResourceKind::Container, ResourceKind::Image, ResourceKind::Network] {
            match self.runtime.prune_unused(kind).await {
                Ok(pruned) => phase
                    .done
                    .push(format!("{kind}s: {} removed", pruned.removed)),
                Err(e) => phase.fail(format!("{kind}s"), e),
            }
        }
        phase
    }

    async fn remove_firewall_rules(&self) -> PhaseReport {
        let mut phase = PhaseReport::new(Phase::RemoveFirewallRules);
        for rule in &self.plan.firewall_rules {
            match firewall::remove_exact(self.firewall, rule).await {
                Ok(0) => phase.already_absent.push(rule.to_string()),
                Ok(_) => phase.done.push(rule.to_string()),
                Err(e) => phase.fail(rule.to_string(), e),
            }
        }
        phase
    }

    /// The entry of `dirs` that contains the certificate directory, if any.
    fn protected_dir(&self, dirs: &[PathBuf]) -> Option<PathBuf> {
        let cert_dir = self.certs.cert_dir()?;
        dirs.iter().find(|d| cert_dir.starts_with(d)).cloned()
    }

    /// Weigh the certificate before `dirs` go and back it up when preserving.
    ///
    /// Returns the guard to release after the destructive step, and the
    /// directory that must be left alone because its backup failed.
    async fn guard_certificate(
        &self,
        dirs: &[PathBuf],
        diag: &mut Diagnostics,
        now: DateTime<Utc>,
    ) -> Result<(Option<CertificateGuard<'a>>, Option<PathBuf>), CleanupError> {
        let Some(containing) = self.protected_dir(dirs) else {
            return Ok((None, None));
        };

        let risk = cert::assess(self.certs, self.plan.domain.as_deref(), now).await;
        let decision = risk.decide(self.prompter)?;
        let outcome = CertificateOutcome {
            class: risk.info.class,
            decision,
            restored: false,
        };

        match PreservedCertificate::begin(self.certs, decision) {
            Ok(held) => Ok((Some(CertificateGuard { held, outcome }), None)),
            Err(e) => {
                diag.warn(Warning::certificate(format!(
                    "certificate backup failed, keeping {}: {e}",
                    containing.display()
                )));
                Ok((None, Some(containing)))
            }
        }
    }

    /// Restore a held certificate. Runs last, after directories are recreated.
    fn release(
        &self,
        guard: Option<CertificateGuard<'_>>,
        diag: &mut Diagnostics,
    ) -> Option<CertificateOutcome> {
        let CertificateGuard { held, mut outcome } = guard?;
        if held.is_holding() {
            outcome.restored = held.restore();
            if !outcome.restored {
                diag.warn(Warning::certificate(format!(
                    "certificate could not be restored to {}",
                    self.certs.cert_path().display()
                )));
            }
        } else {
            // Discarded: nothing to put back.
            let _ = held.restore();
        }
        Some(outcome)
    }

    async fn delete_paths(
        &self,
        phase: Phase,
        paths: &[PathBuf],
        protected: Option<&Path>,
    ) -> PhaseReport {
        let mut report = PhaseReport::new(phase);
        for path in paths {
            let label = path.display().to_string();
            if protected == Some(path.as_path()) {
                report.fail(label, "kept because the certificate inside could not be backed up");
                continue;
            }
            report.record(label, remove_path(path).await);
        }
        report
    }
}

async fn remove_path(path: &Path) -> std::io::Result<Removal> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Removal::AlreadyAbsent),
        Err(e) => return Err(e),
    };
    if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await?;
    } else {
        tokio::fs::remove_file(path).await?;
    }
    Ok(Removal::Removed)
}
