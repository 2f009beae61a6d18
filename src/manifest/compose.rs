// ABOUTME: Applies the manifest with `<engine> compose up`.
// ABOUTME: The slot and its container prefix reach the manifest through the environment.

use super::{ApplyRequest, ManifestApplier, ManifestError};
use crate::process::HostCommand;
use async_trait::async_trait;

pub struct ComposeCli {
    engine_cli: String,
    container_prefix: String,
}

impl ComposeCli {
    pub fn new(engine_cli: impl Into<String>, container_prefix: impl Into<String>) -> Self {
        Self {
            engine_cli: engine_cli.into(),
            container_prefix: container_prefix.into(),
        }
    }

    pub(crate) fn command(&self, request: &ApplyRequest<'_>) -> HostCommand {
        let mut cmd = HostCommand::new(&self.engine_cli)
            .arg("compose")
            .arg("-p")
            .arg(format!("{}-{}", self.container_prefix, request.slot))
            .arg("-f")
            .arg_path(request.manifest.path())
            .args(["up", "-d"])
            .env("HUBSTACK_SLOT", request.slot.as_str())
            .env(
                "HUBSTACK_CONTAINER_PREFIX",
                request.slot.container_prefix(&self.container_prefix),
            );
        if request.remove_orphans {
            cmd = cmd.arg("--remove-orphans");
        }
        cmd.args(request.services.iter().map(|s| s.to_string()))
    }
}

#[async_trait]
impl ManifestApplier for ComposeCli {
    async fn apply(&self, request: &ApplyRequest<'_>) -> Result<(), ManifestError> {
        let cmd = self.command(request);
        let output = cmd.run().await.map_err(|source| ManifestError::Spawn {
            command: cmd.display(),
            source,
        })?;
        if !output.success {
            return Err(ManifestError::Failed {
                command: cmd.display(),
                message: output.summary(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::DeploymentManifest;
    use crate::types::{ServiceName, Slot};
    use std::path::Path;

    fn manifest() -> DeploymentManifest {
        DeploymentManifest::parse(
            Path::new("/srv/hub/docker-compose.yml"),
            "services:\n  adguard: {}\n  memos: {}\n",
        )
        .unwrap()
    }

    #[test]
    fn full_apply_removes_orphans() {
        let manifest = manifest();
        let cli = ComposeCli::new("docker", "dhi");
        let cmd = cli.command(&ApplyRequest {
            manifest: &manifest,
            slot: Slot::B,
            services: vec![],
            remove_orphans: true,
        });
        assert_eq!(
            cmd.display(),
            "docker compose -p dhi-b -f /srv/hub/docker-compose.yml up -d --remove-orphans"
        );
    }

    #[test]
    fn subset_apply_names_services() {
        let manifest = manifest();
        let memos = ServiceName::new("memos").unwrap();
        let cli = ComposeCli::new("podman", "dhi");
        let cmd = cli.command(&ApplyRequest {
            manifest: &manifest,
            slot: Slot::A,
            services: vec![&memos],
            remove_orphans: false,
        });
        assert_eq!(
            cmd.display(),
            "podman compose -p dhi-a -f /srv/hub/docker-compose.yml up -d memos"
        );
    }
}
