// ABOUTME: Final report of a deployment run.
// ABOUTME: Serialized for --json and rendered as text otherwise.

use super::probe::Reachability;
use super::startup::StartupReport;
use crate::cert::TlsOutcome;
use crate::cleanup::CleanupReport;
use crate::types::Slot;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    /// Active slot after the run.
    pub slot: Slot,
    /// Slot the services were started in.
    pub target: Slot,
    pub swapped: bool,
    pub tls: TlsOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<CleanupReport>,
    pub startup: StartupReport,
    /// Containers of the previous slot that were removed.
    pub retired: Vec<String>,
    pub reachability: Reachability,
}

impl fmt::Display for DeployReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Active slot: {}", self.slot)?;
        if self.target != self.slot {
            writeln!(f, "Started in slot {} (not activated)", self.target)?;
        }
        let tls = match &self.tls {
            TlsOutcome::Skipped { .. } => "existing certificate kept".to_string(),
            TlsOutcome::Issued => "certificate issued".to_string(),
            TlsOutcome::KeptExisting { reason, .. } => {
                format!("existing certificate kept ({reason:?})")
            }
            TlsOutcome::SelfSigned { reason, .. } => format!("self-signed ({reason:?})"),
        };
        writeln!(f, "TLS: {tls}")?;
        if let Some(at) = self.tls.retry_at() {
            writeln!(f, "  retry scheduled at {}", at.format("%Y-%m-%d %H:%M UTC"))?;
        }
        if let Some(ref cleanup) = self.cleanup {
            write!(f, "Cleanup:\n{cleanup}")?;
        }
        writeln!(
            f,
            "Services: {}",
            if self.startup.is_healthy() {
                "ready"
            } else {
                "not all ready"
            }
        )?;
        if !self.retired.is_empty() {
            writeln!(f, "Retired: {}", self.retired.join(", "))?;
        }
        write!(f, "Control surface: {}", self.reachability)
    }
}
