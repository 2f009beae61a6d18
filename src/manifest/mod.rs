// ABOUTME: The rendered deployment manifest and how it is applied to the engine.
// ABOUTME: Rendering is external; this module only reads service names and runs compose.

mod compose;

pub use compose::ComposeCli;

use crate::types::{ServiceName, Slot};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed: {message}")]
    Failed { command: String, message: String },
}

/// A rendered compose-style manifest. Only the service names are modeled.
#[derive(Debug, Clone)]
pub struct DeploymentManifest {
    path: PathBuf,
    services: Vec<String>,
}

impl DeploymentManifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self, ManifestError> {
        let parse_error = |reason: String| ManifestError::Parse {
            path: path.to_path_buf(),
            reason,
        };
        let doc: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
        let services = doc
            .get("services")
            .and_then(serde_yaml::Value::as_mapping)
            .ok_or_else(|| parse_error("no services mapping".to_string()))?
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect();
        Ok(Self {
            path: path.to_path_buf(),
            services,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn services(&self) -> &[String] {
        &self.services
    }

    pub fn contains(&self, service: &ServiceName) -> bool {
        self.services.iter().any(|s| s == service.as_str())
    }

    /// Those of `wanted` that the manifest actually defines, in `wanted` order.
    pub fn present<'s>(&self, wanted: &'s [ServiceName]) -> Vec<&'s ServiceName> {
        wanted.iter().filter(|s| self.contains(s)).collect()
    }
}

/// One `up` of the manifest.
#[derive(Debug, Clone)]
pub struct ApplyRequest<'a> {
    pub manifest: &'a DeploymentManifest,
    pub slot: Slot,
    /// Empty means every service in the manifest.
    pub services: Vec<&'a ServiceName>,
    pub remove_orphans: bool,
}

/// Starts services from a manifest.
#[async_trait]
pub trait ManifestApplier: Send + Sync {
    async fn apply(&self, request: &ApplyRequest<'_>) -> Result<(), ManifestError>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::{ApplyRequest, ManifestApplier, ManifestError};
    use crate::runtime::fake::FakeEngine;
    use crate::runtime::{ContainerState, HealthState};
    use crate::types::Slot;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// What one apply call asked for.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct AppliedCall {
        pub slot: Slot,
        pub services: Vec<String>,
        pub remove_orphans: bool,
    }

    /// Records calls and starts `<prefix>-<slot>-<service>` containers on a fake engine.
    pub(crate) struct RecordingApplier<'e> {
        engine: &'e FakeEngine,
        prefix: String,
        fail: bool,
        stuck: Vec<String>,
        calls: Mutex<Vec<AppliedCall>>,
    }

    impl<'e> RecordingApplier<'e> {
        pub(crate) fn new(engine: &'e FakeEngine, prefix: &str) -> Self {
            Self {
                engine,
                prefix: prefix.to_string(),
                fail: false,
                stuck: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// `service` comes up but never reports healthy.
        pub(crate) fn stuck(mut self, service: &str) -> Self {
            self.stuck.push(service.to_string());
            self
        }

        pub(crate) fn failing(engine: &'e FakeEngine, prefix: &str) -> Self {
            Self {
                fail: true,
                ..Self::new(engine, prefix)
            }
        }

        pub(crate) fn calls(&self) -> Vec<AppliedCall> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl ManifestApplier for RecordingApplier<'_> {
        async fn apply(&self, request: &ApplyRequest<'_>) -> Result<(), ManifestError> {
            let services: Vec<String> = if request.services.is_empty() {
                request.manifest.services().to_vec()
            } else {
                request.services.iter().map(|s| s.to_string()).collect()
            };
            self.calls.lock().push(AppliedCall {
                slot: request.slot,
                services: services.clone(),
                remove_orphans: request.remove_orphans,
            });
            if self.fail {
                return Err(ManifestError::Failed {
                    command: "compose up".to_string(),
                    message: "pull access denied".to_string(),
                });
            }
            for service in services {
                let name = format!("{}{}", request.slot.container_prefix(&self.prefix), service);
                let health = if self.stuck.contains(&service) {
                    HealthState::Starting
                } else {
                    HealthState::Unknown
                };
                self.engine
                    .add_container_with(&name, ContainerState::Running, health);
            }
            Ok(())
        }
    }
}
