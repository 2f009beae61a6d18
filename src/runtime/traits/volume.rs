// ABOUTME: Volume operations trait for the container engine.
// ABOUTME: List and remove named volumes.

use super::sealed::Sealed;
use super::shared_types::IsNotFound;
use crate::types::VolumeName;
use async_trait::async_trait;

/// Volume operations: list, remove.
#[async_trait]
pub trait VolumeOps: Sealed + Send + Sync {
    /// List the names of all volumes.
    async fn list_volumes(&self) -> Result<Vec<VolumeName>, VolumeError>;

    /// Remove a volume.
    async fn remove_volume(&self, name: &VolumeName, force: bool) -> Result<(), VolumeError>;
}

/// Errors from volume operations.
#[derive(Debug, thiserror::Error)]
pub enum VolumeError {
    #[error("volume not found: {0}")]
    NotFound(String),

    #[error("volume in use, cannot remove: {0}")]
    InUse(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl IsNotFound for VolumeError {
    fn is_not_found(&self) -> bool {
        matches!(self, VolumeError::NotFound(_))
    }
}
