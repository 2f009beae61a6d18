// ABOUTME: In-memory container engine used by unit tests.
// ABOUTME: Mirrors engine semantics: removing an absent resource reports NotFound.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerState,
    ContainerSummary, HealthState, ImageError, ImageFilters, ImageOps, ImageSummary,
    NetworkError, NetworkOps, PruneError, PruneOps, PruneReport, ResourceKind, RuntimeInfo,
    RuntimeInfoError, RuntimeMetadata, VolumeError, VolumeOps,
};
use crate::types::{ContainerName, ImageName, NetworkName, VolumeName};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

#[derive(Debug, Clone)]
struct FakeContainer {
    state: ContainerState,
    health: HealthState,
}

#[derive(Debug, Default)]
struct State {
    containers: BTreeMap<String, FakeContainer>,
    volumes: BTreeSet<String>,
    networks: BTreeSet<String>,
    images: BTreeMap<String, Vec<String>>,
    prune_calls: Vec<ResourceKind>,
    fail_removals: bool,
}

/// Engine double holding containers, volumes, networks, and images in memory.
#[derive(Debug, Default)]
pub(crate) struct FakeEngine {
    state: Mutex<State>,
}

impl FakeEngine {
    /// A fresh engine carrying the default networks every real engine has.
    pub(crate) fn new() -> Self {
        let engine = Self::default();
        for reserved in ["bridge", "host", "none"] {
            engine.add_network(reserved);
        }
        engine
    }

    pub(crate) fn add_container(&self, name: &str) -> &Self {
        self.add_container_with(name, ContainerState::Running, HealthState::Unknown)
    }

    pub(crate) fn add_container_with(
        &self,
        name: &str,
        state: ContainerState,
        health: HealthState,
    ) -> &Self {
        self.state
            .lock()
            .containers
            .insert(name.to_string(), FakeContainer { state, health });
        self
    }

    pub(crate) fn set_health(&self, name: &str, health: HealthState) {
        if let Some(c) = self.state.lock().containers.get_mut(name) {
            c.health = health;
        }
    }

    pub(crate) fn add_volume(&self, name: &str) -> &Self {
        self.state.lock().volumes.insert(name.to_string());
        self
    }

    pub(crate) fn add_network(&self, name: &str) -> &Self {
        self.state.lock().networks.insert(name.to_string());
        self
    }

    pub(crate) fn add_image(&self, id: &str, tags: &[&str]) -> &Self {
        self.state
            .lock()
            .images
            .insert(id.to_string(), tags.iter().map(|t| t.to_string()).collect());
        self
    }

    /// Make every removal fail with a runtime error.
    pub(crate) fn fail_removals(&self) {
        self.state.lock().fail_removals = true;
    }

    pub(crate) fn container_names(&self) -> Vec<String> {
        self.state.lock().containers.keys().cloned().collect()
    }

    pub(crate) fn container_state(&self, name: &str) -> Option<ContainerState> {
        self.state.lock().containers.get(name).map(|c| c.state)
    }

    pub(crate) fn volume_names(&self) -> Vec<String> {
        self.state.lock().volumes.iter().cloned().collect()
    }

    pub(crate) fn network_names(&self) -> Vec<String> {
        self.state.lock().networks.iter().cloned().collect()
    }

    pub(crate) fn image_ids(&self) -> Vec<String> {
        self.state.lock().images.keys().cloned().collect()
    }

    pub(crate) fn prune_calls(&self) -> Vec<ResourceKind> {
        self.state.lock().prune_calls.clone()
    }
}

impl Sealed for FakeEngine {}

#[async_trait]
impl RuntimeInfo for FakeEngine {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        Ok(RuntimeMetadata {
            name: "Fake".to_string(),
            version: "0.0.0".to_string(),
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        Ok(())
    }
}

#[async_trait]
impl ContainerOps for FakeEngine {
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let state = self.state.lock();
        Ok(state
            .containers
            .iter()
            .filter(|(_, c)| filters.all || c.state == ContainerState::Running)
            .filter(|(name, _)| {
                filters
                    .name
                    .as_ref()
                    .is_none_or(|fragment| name.contains(fragment.as_str()))
            })
            .map(|(name, c)| ContainerSummary {
                name: ContainerName::new(name.clone()),
                image: String::new(),
                state: c.state,
                labels: HashMap::new(),
            })
            .collect())
    }

    async fn stop_container(
        &self,
        name: &ContainerName,
        _timeout: Duration,
    ) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        match state.containers.get_mut(name.as_str()) {
            Some(c) if c.state == ContainerState::Running => {
                c.state = ContainerState::Exited;
                Ok(())
            }
            Some(_) => Err(ContainerError::NotRunning(name.to_string())),
            None => Err(ContainerError::NotFound(name.to_string())),
        }
    }

    async fn remove_container(
        &self,
        name: &ContainerName,
        force: bool,
    ) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        if state.fail_removals {
            return Err(ContainerError::Runtime("engine unavailable".to_string()));
        }
        match state.containers.get(name.as_str()) {
            None => Err(ContainerError::NotFound(name.to_string())),
            Some(c) if c.state == ContainerState::Running && !force => Err(
                ContainerError::Runtime(format!("{} is running, stop it first", name)),
            ),
            Some(_) => {
                state.containers.remove(name.as_str());
                Ok(())
            }
        }
    }

    async fn inspect_container(
        &self,
        name: &ContainerName,
    ) -> Result<ContainerInfo, ContainerError> {
        let state = self.state.lock();
        let c = state
            .containers
            .get(name.as_str())
            .ok_or_else(|| ContainerError::NotFound(name.to_string()))?;
        Ok(ContainerInfo {
            name: name.clone(),
            state: c.state,
            health: c.health,
        })
    }
}

#[async_trait]
impl VolumeOps for FakeEngine {
    async fn list_volumes(&self) -> Result<Vec<VolumeName>, VolumeError> {
        Ok(self
            .state
            .lock()
            .volumes
            .iter()
            .map(|v| VolumeName::new(v.clone()))
            .collect())
    }

    async fn remove_volume(&self, name: &VolumeName, _force: bool) -> Result<(), VolumeError> {
        let mut state = self.state.lock();
        if state.fail_removals {
            return Err(VolumeError::Runtime("engine unavailable".to_string()));
        }
        if state.volumes.remove(name.as_str()) {
            Ok(())
        } else {
            Err(VolumeError::NotFound(name.to_string()))
        }
    }
}

#[async_trait]
impl NetworkOps for FakeEngine {
    async fn list_networks(&self) -> Result<Vec<NetworkName>, NetworkError> {
        Ok(self
            .state
            .lock()
            .networks
            .iter()
            .map(|n| NetworkName::new(n.clone()))
            .collect())
    }

    async fn remove_network(&self, name: &NetworkName) -> Result<(), NetworkError> {
        let mut state = self.state.lock();
        if state.fail_removals {
            return Err(NetworkError::Runtime("engine unavailable".to_string()));
        }
        if matches!(name.as_str(), "bridge" | "host" | "none") {
            return Err(NetworkError::InUse(format!(
                "{} is a pre-defined network and cannot be removed",
                name
            )));
        }
        if state.networks.remove(name.as_str()) {
            Ok(())
        } else {
            Err(NetworkError::NotFound(name.to_string()))
        }
    }
}

#[async_trait]
impl ImageOps for FakeEngine {
    async fn list_images(&self, filters: &ImageFilters) -> Result<Vec<ImageSummary>, ImageError> {
        let state = self.state.lock();
        Ok(state
            .images
            .iter()
            .map(|(id, tags)| ImageSummary {
                id: ImageName::new(id.clone()),
                tags: tags.clone(),
            })
            .filter(|image| !filters.dangling || image.is_dangling())
            .filter(|image| {
                filters.reference.as_ref().is_none_or(|reference| {
                    image.tags.iter().any(|t| t.starts_with(reference.as_str()))
                })
            })
            .collect())
    }

    async fn remove_image(&self, name: &ImageName, _force: bool) -> Result<(), ImageError> {
        let mut state = self.state.lock();
        if state.fail_removals {
            return Err(ImageError::Runtime("engine unavailable".to_string()));
        }
        let key = state
            .images
            .iter()
            .find(|(id, tags)| *id == name.as_str() || tags.iter().any(|t| t == name.as_str()))
            .map(|(id, _)| id.clone());
        match key {
            Some(id) => {
                state.images.remove(&id);
                Ok(())
            }
            None => Err(ImageError::NotFound(name.to_string())),
        }
    }
}

#[async_trait]
impl PruneOps for FakeEngine {
    async fn prune_unused(&self, kind: ResourceKind) -> Result<PruneReport, PruneError> {
        let mut state = self.state.lock();
        state.prune_calls.push(kind);
        let removed = match kind {
            ResourceKind::Container => {
                let before = state.containers.len();
                state
                    .containers
                    .retain(|_, c| c.state == ContainerState::Running);
                before - state.containers.len()
            }
            ResourceKind::Image => {
                let before = state.images.len();
                state
                    .images
                    .retain(|_, tags| !tags.is_empty() && tags.iter().any(|t| t != "<none>:<none>"));
                before - state.images.len()
            }
            ResourceKind::Volume | ResourceKind::Network => 0,
        };
        Ok(PruneReport {
            removed,
            reclaimed_bytes: 0,
        })
    }
}
