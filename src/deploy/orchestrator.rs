// ABOUTME: DeploymentOrchestrator: plan, clean, provision TLS, start, finalize, verify.
// ABOUTME: Wires the stage transitions to the configured collaborators.

use super::Deployment;
use super::error::DeployError;
use super::health::HealthPolicy;
use super::report::DeployReport;
use super::startup::StartupPlan;
use crate::cert::CertificateIssuer;
use crate::cleanup::CleanupOrchestrator;
use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::manifest::{DeploymentManifest, ManifestApplier};
use crate::runtime::FullRuntime;
use crate::slot::SlotManager;
use crate::types::ServiceName;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// What the operator asked for on this run.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    pub parallel: bool,
    pub swap: bool,
    /// Empty means every service.
    pub services: Vec<ServiceName>,
    /// Remove the targeted containers before starting them.
    pub clean_first: bool,
}

/// Deployment-wide settings taken from the config file.
#[derive(Debug, Clone)]
pub struct DeploySettings {
    pub manifest_path: PathBuf,
    pub container_prefix: String,
    pub services: Vec<ServiceName>,
    pub infra_critical: Vec<ServiceName>,
    pub health: HealthPolicy,
    pub control_url: Option<String>,
    pub probe_timeout: Duration,
}

impl DeploySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            manifest_path: config.manifest_file(),
            container_prefix: config.app.container_prefix.clone(),
            services: config.services.iter().cloned().collect(),
            infra_critical: config.infra_critical.clone(),
            health: HealthPolicy {
                ticks: config.health.ticks,
                interval: config.health.interval,
            },
            control_url: config.control_url.clone(),
            probe_timeout: config.health.probe_timeout,
        }
    }
}

pub struct DeploymentOrchestrator<'a, R: FullRuntime> {
    runtime: &'a R,
    issuer: &'a CertificateIssuer<'a>,
    cleanup: &'a CleanupOrchestrator<'a, R>,
    applier: &'a dyn ManifestApplier,
    settings: DeploySettings,
}

impl<'a, R: FullRuntime> DeploymentOrchestrator<'a, R> {
    pub fn new(
        runtime: &'a R,
        issuer: &'a CertificateIssuer<'a>,
        cleanup: &'a CleanupOrchestrator<'a, R>,
        applier: &'a dyn ManifestApplier,
        settings: DeploySettings,
    ) -> Self {
        Self {
            runtime,
            issuer,
            cleanup,
            applier,
            settings,
        }
    }

    /// Run a full deployment.
    ///
    /// Halts on a declined cleanup, a failed pre-swap backup, a fatal TLS error,
    /// or an unreadable manifest. Everything else lands in `diag`.
    pub async fn run(
        &self,
        slots: &mut SlotManager,
        options: &DeployOptions,
        diag: &mut Diagnostics,
        now: DateTime<Utc>,
    ) -> Result<DeployReport, DeployError> {
        let mut deployment = Deployment::plan(slots, options.swap, now)?;

        if options.clean_first {
            let targets = if options.services.is_empty() {
                &self.settings.services
            } else {
                &options.services
            };
            deployment = deployment.clean(self.cleanup, targets, diag, now).await?;
        }

        let deployment = deployment.provision_tls(self.issuer, diag, now).await?;

        let manifest = DeploymentManifest::load(&self.settings.manifest_path)?;
        let plan = StartupPlan {
            parallel: options.parallel,
            selected: &options.services,
            infra_critical: &self.settings.infra_critical,
            container_prefix: &self.settings.container_prefix,
            health: self.settings.health,
        };
        let deployment = deployment
            .start(self.runtime, self.applier, &manifest, &plan, diag)
            .await;

        let deployment = deployment.finalize(slots, self.runtime, diag).await?;
        Ok(deployment
            .verify(
                self.settings.control_url.as_deref(),
                self.settings.probe_timeout,
            )
            .await)
    }
}
