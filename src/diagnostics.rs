// ABOUTME: Diagnostics accumulator for non-fatal warnings during a run.
// ABOUTME: Collects failures that must not stop the run but should be shown to users.

use serde::Serialize;

/// Collects non-fatal warnings during cleanup, issuance, and deployment.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Count warnings of one kind.
    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}

/// A non-fatal warning collected during a run.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A resource could not be removed.
    pub fn cleanup(message: impl Into<String>) -> Self {
        Self::new(WarningKind::Cleanup, message)
    }

    /// The DNS record could not be pointed at this host.
    pub fn dns_update(message: impl Into<String>) -> Self {
        Self::new(WarningKind::DnsUpdate, message)
    }

    /// Certificate issuance failed and a fallback was used.
    pub fn issuance(message: impl Into<String>) -> Self {
        Self::new(WarningKind::Issuance, message)
    }

    /// Issuance was rate limited.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(WarningKind::RateLimited, message)
    }

    /// Certificate backup or restore did not complete.
    pub fn certificate(message: impl Into<String>) -> Self {
        Self::new(WarningKind::Certificate, message)
    }

    /// Services did not become ready within the polling window.
    pub fn health_timeout(message: impl Into<String>) -> Self {
        Self::new(WarningKind::HealthTimeout, message)
    }

    /// Starting services failed.
    pub fn startup(message: impl Into<String>) -> Self {
        Self::new(WarningKind::Startup, message)
    }

    /// Stopping the inactive slot failed.
    pub fn slot(message: impl Into<String>) -> Self {
        Self::new(WarningKind::Slot, message)
    }
}

/// Categories of warnings that can occur during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Failed to remove a container, volume, network, image, or file.
    Cleanup,
    /// Failed to update the DNS record.
    DnsUpdate,
    /// Certificate issuance failed.
    Issuance,
    /// Certificate issuance hit the issuer's rate limit.
    RateLimited,
    /// Certificate backup or restore problem.
    Certificate,
    /// Health polling ran out of ticks.
    HealthTimeout,
    /// Applying the manifest failed.
    Startup,
    /// Slot bookkeeping problem.
    Slot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::cleanup("network dhi_default in use"));
        diag.warn(Warning::dns_update("connection reset"));
        diag.warn(Warning::cleanup("volume dhi_data in use"));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 3);
        assert_eq!(diag.count(WarningKind::Cleanup), 2);
        assert_eq!(diag.count(WarningKind::RateLimited), 0);
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(Warning::issuance("x").kind, WarningKind::Issuance);
        assert_eq!(Warning::rate_limited("x").kind, WarningKind::RateLimited);
        assert_eq!(Warning::health_timeout("x").kind, WarningKind::HealthTimeout);
    }

    #[test]
    fn warning_kind_serializes_snake_case() {
        let json = serde_json::to_string(&Warning::dns_update("down")).unwrap();
        assert!(json.contains("\"dns_update\""));
    }
}
