// ABOUTME: Container operations trait for the container engine.
// ABOUTME: List, stop, remove, and inspect containers by name.

use super::sealed::Sealed;
use super::shared_types::{ContainerInfo, ContainerSummary, IsNotFound};
use crate::types::ContainerName;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Container lifecycle operations.
#[async_trait]
pub trait ContainerOps: Sealed + Send + Sync {
    /// List containers matching the given filters.
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError>;

    /// Stop a running container.
    async fn stop_container(
        &self,
        name: &ContainerName,
        timeout: Duration,
    ) -> Result<(), ContainerError>;

    /// Remove a container.
    async fn remove_container(
        &self,
        name: &ContainerName,
        force: bool,
    ) -> Result<(), ContainerError>;

    /// Get state and health of a container.
    async fn inspect_container(&self, name: &ContainerName)
    -> Result<ContainerInfo, ContainerError>;
}

/// Filters for listing containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    /// Filter by label (key=value).
    pub labels: HashMap<String, String>,
    /// Filter by name (engine-side substring match).
    pub name: Option<String>,
    /// Include stopped containers.
    pub all: bool,
}

impl ContainerFilters {
    /// Every container, running or not.
    pub fn everything() -> Self {
        Self {
            all: true,
            ..Default::default()
        }
    }

    /// Containers whose name contains `fragment`, running or not.
    pub fn name_contains(fragment: impl Into<String>) -> Self {
        Self {
            name: Some(fragment.into()),
            all: true,
            ..Default::default()
        }
    }
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("container not running: {0}")]
    NotRunning(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl IsNotFound for ContainerError {
    fn is_not_found(&self) -> bool {
        matches!(self, ContainerError::NotFound(_))
    }
}
