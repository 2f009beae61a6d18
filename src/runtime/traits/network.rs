// ABOUTME: Network operations trait for the container engine.
// ABOUTME: List and remove networks by name.

use super::sealed::Sealed;
use super::shared_types::IsNotFound;
use crate::types::NetworkName;
use async_trait::async_trait;

/// Network operations: list, remove.
#[async_trait]
pub trait NetworkOps: Sealed + Send + Sync {
    /// List the names of all networks, including the engine's own.
    async fn list_networks(&self) -> Result<Vec<NetworkName>, NetworkError>;

    /// Remove a network.
    async fn remove_network(&self, name: &NetworkName) -> Result<(), NetworkError>;
}

/// Errors from network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("network not found: {0}")]
    NotFound(String),

    #[error("network in use, cannot remove: {0}")]
    InUse(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl IsNotFound for NetworkError {
    fn is_not_found(&self) -> bool {
        matches!(self, NetworkError::NotFound(_))
    }
}
