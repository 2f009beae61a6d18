// ABOUTME: Garbage-collection trait for the container engine.
// ABOUTME: Prunes unused resources of one kind at a time.

use super::sealed::Sealed;
use super::shared_types::{PruneReport, ResourceKind};
use async_trait::async_trait;

/// Engine garbage collection.
#[async_trait]
pub trait PruneOps: Sealed + Send + Sync {
    /// Remove unused resources of `kind` (stopped containers, unused
    /// networks and volumes, dangling images).
    async fn prune_unused(&self, kind: ResourceKind) -> Result<PruneReport, PruneError>;
}

#[derive(Debug, thiserror::Error)]
#[error("failed to prune {kind}s: {message}")]
pub struct PruneError {
    pub kind: ResourceKind,
    pub message: String,
}
