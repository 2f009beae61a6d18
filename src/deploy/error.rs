// ABOUTME: Errors that stop a deployment run.
// ABOUTME: Everything else a run meets is recorded in Diagnostics and the run continues.

use crate::cert::CertError;
use crate::cleanup::CleanupError;
use crate::manifest::ManifestError;
use crate::slot::SlotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    /// No TLS material could be produced.
    #[error("certificate: {0}")]
    Certificate(#[from] CertError),

    /// The pre-deploy cleanup was declined.
    #[error("cleanup: {0}")]
    Cleanup(#[from] CleanupError),

    /// Backup before the swap or persisting the slot pointer failed.
    #[error("slot: {0}")]
    Slot(#[from] SlotError),

    /// The manifest could not be read.
    #[error("manifest: {0}")]
    Manifest(#[from] ManifestError),
}
