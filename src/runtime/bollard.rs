// ABOUTME: Bollard-based container engine client.
// ABOUTME: Supports both Docker and Podman via the Docker-compatible API.

use crate::runtime::traits::sealed::Sealed;
use crate::runtime::traits::{
    ContainerError, ContainerFilters, ContainerInfo, ContainerOps, ContainerState,
    ContainerSummary, HealthState, ImageError, ImageFilters, ImageOps, ImageSummary,
    NetworkError, NetworkOps, PruneError, PruneOps, PruneReport, ResourceKind, RuntimeInfo,
    RuntimeInfoError, RuntimeMetadata, VolumeError, VolumeOps,
};
use crate::runtime::engine::{EngineKind, EngineSocket};
use crate::types::{ContainerName, ImageName, NetworkName, VolumeName};
use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::{
    InspectContainerOptions, ListContainersOptions, ListImagesOptions, ListNetworksOptions,
    ListVolumesOptions, PruneContainersOptions, PruneImagesOptions, PruneNetworksOptions,
    PruneVolumesOptions, RemoveContainerOptions, RemoveImageOptions, RemoveVolumeOptions,
    StopContainerOptions,
};
use std::collections::HashMap;
use std::time::Duration;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn server_status(e: &bollard::errors::Error) -> Option<(u16, &str)> {
    match e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } => Some((*status_code, message.as_str())),
        _ => None,
    }
}

fn map_container_error(e: bollard::errors::Error, name: &ContainerName) -> ContainerError {
    match server_status(&e) {
        Some((404, _)) => ContainerError::NotFound(name.to_string()),
        Some((304, _)) => ContainerError::NotRunning(name.to_string()),
        _ => ContainerError::Runtime(format!("{}: {}", name, e)),
    }
}

fn map_volume_error(e: bollard::errors::Error, name: &VolumeName) -> VolumeError {
    match server_status(&e) {
        Some((404, _)) => VolumeError::NotFound(name.to_string()),
        Some((409, message)) => VolumeError::InUse(format!("{}: {}", name, message)),
        _ => VolumeError::Runtime(format!("{}: {}", name, e)),
    }
}

fn map_network_error(e: bollard::errors::Error, name: &NetworkName) -> NetworkError {
    match server_status(&e) {
        Some((404, _)) => NetworkError::NotFound(name.to_string()),
        Some((403, message)) | Some((409, message)) => {
            NetworkError::InUse(format!("{}: {}", name, message))
        }
        _ => NetworkError::Runtime(format!("{}: {}", name, e)),
    }
}

fn map_image_error(e: bollard::errors::Error, name: &ImageName) -> ImageError {
    match server_status(&e) {
        Some((404, _)) => ImageError::NotFound(name.to_string()),
        Some((409, message)) => ImageError::InUse(format!("{}: {}", name, message)),
        _ => ImageError::Runtime(format!("failed to remove {}: {}", name, e)),
    }
}

fn prune_error(kind: ResourceKind, e: bollard::errors::Error) -> PruneError {
    PruneError {
        kind,
        message: e.to_string(),
    }
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Container engine client using bollard.
pub struct BollardRuntime {
    client: Docker,
    kind: EngineKind,
}

impl BollardRuntime {
    pub fn new(client: Docker, kind: EngineKind) -> Self {
        Self { client, kind }
    }

    /// Open the engine behind a detected socket. Does not talk to it yet.
    pub fn connect(socket: &EngineSocket) -> Result<Self, RuntimeInfoError> {
        let path = socket.path.to_string_lossy();
        let client = Docker::connect_with_unix(&path, 120, bollard::API_DEFAULT_VERSION)
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(Self::new(client, socket.kind))
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }
}

impl Sealed for BollardRuntime {}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        let info = self
            .client
            .info()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;

        let name = self.kind.display_name().to_string();

        Ok(RuntimeMetadata {
            name,
            version: info.server_version.unwrap_or_default(),
            os: info.operating_system.unwrap_or_default(),
            arch: info.architecture.unwrap_or_default(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();

        if let Some(ref name) = filters.name {
            filter_map.insert("name".to_string(), vec![name.clone()]);
        }

        for (key, value) in &filters.labels {
            filter_map
                .entry("label".to_string())
                .or_default()
                .push(format!("{}={}", key, value));
        }

        let opts = ListContainersOptions {
            all: filters.all,
            filters: Some(filter_map),
            ..Default::default()
        };

        // Podman reports "stopping" as a container state during shutdown, but bollard
        // doesn't recognize it and fails deserialization. Retry after a short delay
        // since "stopping" is a transient state.
        let mut last_error = None;
        for attempt in 0..3 {
            match self.client.list_containers(Some(opts.clone())).await {
                Ok(containers) => {
                    return Ok(containers
                        .into_iter()
                        .map(|c| {
                            let name = c
                                .names
                                .unwrap_or_default()
                                .first()
                                .map(|n| n.trim_start_matches('/').to_string())
                                .unwrap_or_default();

                            let state = c
                                .state
                                .map(|s| ContainerState::from_engine(&format!("{:?}", s)))
                                .unwrap_or(ContainerState::Unknown);

                            ContainerSummary {
                                name: ContainerName::new(name),
                                image: c.image.unwrap_or_default(),
                                state,
                                labels: c.labels.unwrap_or_default(),
                            }
                        })
                        .collect());
                }
                Err(e) => {
                    let err_str = e.to_string();
                    if (err_str.contains("unknown variant `stopping`")
                        || err_str.contains("unknown variant `stopped`"))
                        && attempt < 2
                    {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        last_error = Some(err_str);
                        continue;
                    }
                    return Err(ContainerError::Runtime(err_str));
                }
            }
        }

        Err(ContainerError::Runtime(
            last_error.unwrap_or_else(|| "list_containers failed".to_string()),
        ))
    }

    async fn stop_container(
        &self,
        name: &ContainerName,
        timeout: Duration,
    ) -> Result<(), ContainerError> {
        let opts = StopContainerOptions {
            t: Some(timeout.as_secs() as i32),
            signal: None,
        };

        self.client
            .stop_container(name.as_str(), Some(opts))
            .await
            .map_err(|e| map_container_error(e, name))
    }

    async fn remove_container(
        &self,
        name: &ContainerName,
        force: bool,
    ) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force,
            ..Default::default()
        };

        self.client
            .remove_container(name.as_str(), Some(opts))
            .await
            .map_err(|e| map_container_error(e, name))
    }

    async fn inspect_container(
        &self,
        name: &ContainerName,
    ) -> Result<ContainerInfo, ContainerError> {
        let details = self
            .client
            .inspect_container(name.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(|e| map_container_error(e, name))?;

        let state = details
            .state
            .as_ref()
            .and_then(|s| s.status)
            .map(|s| match s {
                bollard::models::ContainerStateStatusEnum::CREATED => ContainerState::Created,
                bollard::models::ContainerStateStatusEnum::RUNNING => ContainerState::Running,
                bollard::models::ContainerStateStatusEnum::PAUSED => ContainerState::Paused,
                bollard::models::ContainerStateStatusEnum::RESTARTING => ContainerState::Restarting,
                bollard::models::ContainerStateStatusEnum::REMOVING => ContainerState::Removing,
                bollard::models::ContainerStateStatusEnum::EXITED => ContainerState::Exited,
                bollard::models::ContainerStateStatusEnum::DEAD => ContainerState::Dead,
                _ => ContainerState::Unknown,
            })
            .unwrap_or(ContainerState::Unknown);

        let health = details
            .state
            .as_ref()
            .and_then(|s| s.health.as_ref())
            .and_then(|h| h.status)
            .map(|s| match s {
                bollard::models::HealthStatusEnum::STARTING => HealthState::Starting,
                bollard::models::HealthStatusEnum::HEALTHY => HealthState::Healthy,
                bollard::models::HealthStatusEnum::UNHEALTHY => HealthState::Unhealthy,
                _ => HealthState::Unknown,
            })
            .unwrap_or(HealthState::Unknown);

        Ok(ContainerInfo {
            name: name.clone(),
            state,
            health,
        })
    }
}

#[async_trait]
impl VolumeOps for BollardRuntime {
    async fn list_volumes(&self) -> Result<Vec<VolumeName>, VolumeError> {
        let response = self
            .client
            .list_volumes(None::<ListVolumesOptions>)
            .await
            .map_err(|e| VolumeError::Runtime(e.to_string()))?;

        Ok(response
            .volumes
            .unwrap_or_default()
            .into_iter()
            .map(|v| VolumeName::new(v.name))
            .collect())
    }

    async fn remove_volume(&self, name: &VolumeName, force: bool) -> Result<(), VolumeError> {
        let opts = RemoveVolumeOptions { force };

        self.client
            .remove_volume(name.as_str(), Some(opts))
            .await
            .map_err(|e| map_volume_error(e, name))
    }
}

#[async_trait]
impl NetworkOps for BollardRuntime {
    async fn list_networks(&self) -> Result<Vec<NetworkName>, NetworkError> {
        let networks = self
            .client
            .list_networks(None::<ListNetworksOptions>)
            .await
            .map_err(|e| NetworkError::Runtime(e.to_string()))?;

        Ok(networks
            .into_iter()
            .filter_map(|n| n.name)
            .map(NetworkName::new)
            .collect())
    }

    async fn remove_network(&self, name: &NetworkName) -> Result<(), NetworkError> {
        self.client
            .remove_network(name.as_str())
            .await
            .map_err(|e| map_network_error(e, name))
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn list_images(&self, filters: &ImageFilters) -> Result<Vec<ImageSummary>, ImageError> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();
        if filters.dangling {
            filter_map.insert("dangling".to_string(), vec!["true".to_string()]);
        }
        if let Some(ref reference) = filters.reference {
            filter_map.insert("reference".to_string(), vec![reference.clone()]);
        }

        let opts = ListImagesOptions {
            all: false,
            filters: Some(filter_map),
            ..Default::default()
        };

        let images = self
            .client
            .list_images(Some(opts))
            .await
            .map_err(|e| ImageError::Runtime(e.to_string()))?;

        Ok(images
            .into_iter()
            .map(|i| ImageSummary {
                id: ImageName::new(i.id),
                tags: i.repo_tags,
            })
            .collect())
    }

    async fn remove_image(&self, name: &ImageName, force: bool) -> Result<(), ImageError> {
        let opts = RemoveImageOptions {
            force,
            ..Default::default()
        };

        self.client
            .remove_image(name.as_str(), Some(opts), None)
            .await
            .map_err(|e| map_image_error(e, name))?;

        Ok(())
    }
}

#[async_trait]
impl PruneOps for BollardRuntime {
    async fn prune_unused(&self, kind: ResourceKind) -> Result<PruneReport, PruneError> {
        match kind {
            ResourceKind::Container => {
                let r = self
                    .client
                    .prune_containers(None::<PruneContainersOptions>)
                    .await
                    .map_err(|e| prune_error(kind, e))?;
                Ok(PruneReport {
                    removed: r.containers_deleted.map(|d| d.len()).unwrap_or(0),
                    reclaimed_bytes: r.space_reclaimed.unwrap_or(0).max(0) as u64,
                })
            }
            ResourceKind::Volume => {
                let r = self
                    .client
                    .prune_volumes(None::<PruneVolumesOptions>)
                    .await
                    .map_err(|e| prune_error(kind, e))?;
                Ok(PruneReport {
                    removed: r.volumes_deleted.map(|d| d.len()).unwrap_or(0),
                    reclaimed_bytes: r.space_reclaimed.unwrap_or(0).max(0) as u64,
                })
            }
            ResourceKind::Network => {
                let r = self
                    .client
                    .prune_networks(None::<PruneNetworksOptions>)
                    .await
                    .map_err(|e| prune_error(kind, e))?;
                Ok(PruneReport {
                    removed: r.networks_deleted.map(|d| d.len()).unwrap_or(0),
                    reclaimed_bytes: 0,
                })
            }
            ResourceKind::Image => {
                let r = self
                    .client
                    .prune_images(None::<PruneImagesOptions>)
                    .await
                    .map_err(|e| prune_error(kind, e))?;
                Ok(PruneReport {
                    removed: r.images_deleted.map(|d| d.len()).unwrap_or(0),
                    reclaimed_bytes: r.space_reclaimed.unwrap_or(0).max(0) as u64,
                })
            }
        }
    }
}
