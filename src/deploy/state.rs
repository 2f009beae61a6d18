// ABOUTME: Deployment stage markers for the type state pattern.
// ABOUTME: Each stage carries what the earlier stages produced.

use super::startup::StartupReport;
use crate::cert::TlsOutcome;
use crate::types::Slot;

/// Target slot chosen, nothing touched yet.
/// Available actions: `clean()`, `provision_tls()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Planned;

/// TLS material is on disk.
/// Available actions: `start()`
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub(crate) tls: TlsOutcome,
}

/// Services applied and polled.
/// Available actions: `finalize()`
#[derive(Debug, Clone)]
pub struct Started {
    pub(crate) tls: TlsOutcome,
    pub(crate) startup: StartupReport,
}

/// Slot pointer settled.
/// Available actions: `verify()`
#[derive(Debug, Clone)]
pub struct Completed {
    pub(crate) tls: TlsOutcome,
    pub(crate) startup: StartupReport,
    pub(crate) active: Slot,
    pub(crate) swapped: bool,
    pub(crate) retired: Vec<String>,
}
