// ABOUTME: Per-phase outcome records for cleanup and revert.
// ABOUTME: Failures are recorded and surfaced as warnings; they never stop later phases.

use crate::cert::{CertificateClass, Preservation};
use crate::diagnostics::{Diagnostics, Warning};
use crate::runtime::Removal;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    StopContainers,
    RemoveContainers,
    RemoveVolumes,
    RemoveNetworks,
    RemoveImages,
    RemoveState,
    RemoveScheduledTasks,
    PruneEngine,
    RemoveFirewallRules,
    WipeData,
}

impl Phase {
    /// Full revert order.
    pub const REVERT: [Phase; 9] = [
        Phase::StopContainers,
        Phase::RemoveContainers,
        Phase::RemoveVolumes,
        Phase::RemoveNetworks,
        Phase::RemoveImages,
        Phase::RemoveState,
        Phase::RemoveScheduledTasks,
        Phase::PruneEngine,
        Phase::RemoveFirewallRules,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Phase::StopContainers => "stop containers",
            Phase::RemoveContainers => "remove containers",
            Phase::RemoveVolumes => "remove volumes",
            Phase::RemoveNetworks => "remove networks",
            Phase::RemoveImages => "remove images",
            Phase::RemoveState => "remove state directories",
            Phase::RemoveScheduledTasks => "remove scheduled tasks",
            Phase::PruneEngine => "prune engine",
            Phase::RemoveFirewallRules => "remove firewall rules",
            Phase::WipeData => "wipe data directory",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub target: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    pub phase: Phase,
    /// Targets acted on (removed, stopped, deleted).
    pub done: Vec<String>,
    pub already_absent: Vec<String>,
    pub failed: Vec<Failure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl PhaseReport {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            done: Vec::new(),
            already_absent: Vec::new(),
            failed: Vec::new(),
            skipped: None,
        }
    }

    pub fn record<E: fmt::Display>(&mut self, target: impl Into<String>, result: Result<Removal, E>) {
        let target = target.into();
        match result {
            Ok(Removal::Removed) => self.done.push(target),
            Ok(Removal::AlreadyAbsent) => self.already_absent.push(target),
            Err(e) => self.fail(target, e),
        }
    }

    pub fn fail(&mut self, target: impl Into<String>, error: impl fmt::Display) {
        self.failed.push(Failure {
            target: target.into(),
            error: error.to_string(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// What happened to the certificate during a destructive run.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateOutcome {
    pub class: CertificateClass,
    pub decision: Preservation,
    pub restored: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub phases: Vec<PhaseReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateOutcome>,
}

impl CleanupReport {
    /// Append a finished phase, logging its outcome and recording failures as warnings.
    pub fn push(&mut self, report: PhaseReport, diag: &mut Diagnostics) {
        for failure in &report.failed {
            diag.warn(Warning::cleanup(format!(
                "{}: {}: {}",
                report.phase.label(),
                failure.target,
                failure.error
            )));
        }
        match &report.skipped {
            Some(reason) => tracing::info!("{}: skipped ({})", report.phase.label(), reason),
            None => tracing::info!(
                done = report.done.len(),
                already_absent = report.already_absent.len(),
                failed = report.failed.len(),
                "{}",
                report.phase.label()
            ),
        }
        self.phases.push(report);
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    pub fn done_count(&self) -> usize {
        self.phases.iter().map(|p| p.done.len()).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.phases.iter().map(|p| p.failed.len()).sum()
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.phases {
            if let Some(ref reason) = p.skipped {
                writeln!(f, "  - {}: skipped ({})", p.phase.label(), reason)?;
                continue;
            }
            write!(f, "  - {}: {} done", p.phase.label(), p.done.len())?;
            if !p.already_absent.is_empty() {
                write!(f, ", {} already gone", p.already_absent.len())?;
            }
            if !p.failed.is_empty() {
                write!(f, ", {} failed", p.failed.len())?;
            }
            writeln!(f)?;
        }
        if let Some(ref cert) = self.certificate {
            writeln!(
                f,
                "  - certificate ({:?}): {:?}{}",
                cert.class,
                cert.decision,
                if cert.restored { ", restored" } else { "" }
            )?;
        }
        Ok(())
    }
}
