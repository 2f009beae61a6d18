// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: Resource kinds, container state/health, summaries, and removal outcomes.

use crate::types::{ContainerName, ImageName};
use std::collections::HashMap;
use std::fmt;

/// The kinds of engine resource cleanup can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Container,
    Volume,
    Network,
    Image,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Container => "container",
            ResourceKind::Volume => "volume",
            ResourceKind::Network => "network",
            ResourceKind::Image => "image",
        })
    }
}

/// Outcome of a removal that tolerated absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    AlreadyAbsent,
}

/// Errors that can say "the resource was not there".
pub trait IsNotFound {
    fn is_not_found(&self) -> bool;
}

/// Treat "resource not found" as a successful removal.
pub trait TolerateAbsent<E> {
    fn tolerate_absent(self) -> Result<Removal, E>;
}

impl<E: IsNotFound> TolerateAbsent<E> for Result<(), E> {
    fn tolerate_absent(self) -> Result<Removal, E> {
        match self {
            Ok(()) => Ok(Removal::Removed),
            Err(e) if e.is_not_found() => Ok(Removal::AlreadyAbsent),
            Err(e) => Err(e),
        }
    }
}

/// Container lifecycle state as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    Unknown,
}

impl ContainerState {
    /// Parse the engine's lowercase state string.
    pub fn from_engine(state: &str) -> Self {
        match state.trim().to_ascii_lowercase().as_str() {
            "created" => ContainerState::Created,
            "running" => ContainerState::Running,
            "paused" => ContainerState::Paused,
            "restarting" => ContainerState::Restarting,
            "removing" => ContainerState::Removing,
            "exited" | "stopped" => ContainerState::Exited,
            "dead" => ContainerState::Dead,
            _ => ContainerState::Unknown,
        }
    }
}

/// Health of a container. `Unknown` covers containers without a healthcheck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Starting,
    Healthy,
    Unhealthy,
    Unknown,
}

/// Summary information about a container.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub name: ContainerName,
    pub image: String,
    pub state: ContainerState,
    pub labels: HashMap<String, String>,
}

/// State and health of a single container.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    pub name: ContainerName,
    pub state: ContainerState,
    pub health: HealthState,
}

impl ContainerInfo {
    /// Ready means healthy, or running when no healthcheck is defined.
    pub fn is_ready(&self) -> bool {
        match self.health {
            HealthState::Healthy => true,
            HealthState::Unknown => self.state == ContainerState::Running,
            HealthState::Starting | HealthState::Unhealthy => false,
        }
    }
}

/// Summary information about an image.
#[derive(Debug, Clone)]
pub struct ImageSummary {
    pub id: ImageName,
    pub tags: Vec<String>,
}

impl ImageSummary {
    /// Untagged images are dangling.
    pub fn is_dangling(&self) -> bool {
        self.tags.is_empty() || self.tags.iter().all(|t| t == "<none>:<none>")
    }
}

/// What an engine prune pass reclaimed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: usize,
    pub reclaimed_bytes: u64,
}
