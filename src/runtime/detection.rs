// ABOUTME: Finds the engine socket on the local host.
// ABOUTME: Rootless Podman, then rootful Podman, then Docker, unless configured explicitly.

use super::engine::{EngineConfig, EngineKind, EngineSocket};
use super::error::{NotFoundSnafu, RuntimeError};
use std::path::{Path, PathBuf};

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Resolve the socket to connect to.
///
/// An explicit `kind` skips probing; an explicit `socket` overrides the kind's default path.
/// Without a kind, the first existing socket wins:
/// 1. `/run/user/$UID/podman/podman.sock`
/// 2. `/run/podman/podman.sock`
/// 3. `/var/run/docker.sock`
pub fn detect_local(config: &EngineConfig) -> Result<EngineSocket, RuntimeError> {
    if let Some(kind) = config.kind {
        let path = config
            .socket
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_socket(kind)));
        return Ok(EngineSocket { kind, path });
    }

    let candidates = candidate_sockets(current_uid().as_deref());
    for (kind, path) in &candidates {
        if path.exists() {
            return Ok(EngineSocket {
                kind: *kind,
                path: path.clone(),
            });
        }
    }

    NotFoundSnafu {
        checked: candidates
            .iter()
            .map(|(_, p)| p.display().to_string())
            .collect::<Vec<_>>(),
    }
    .fail()
}

fn candidate_sockets(uid: Option<&str>) -> Vec<(EngineKind, PathBuf)> {
    let mut candidates = Vec::with_capacity(3);
    if let Some(uid) = uid {
        candidates.push((
            EngineKind::Podman,
            Path::new("/run/user").join(uid).join("podman/podman.sock"),
        ));
    }
    candidates.push((EngineKind::Podman, PathBuf::from(ROOTFUL_PODMAN)));
    candidates.push((EngineKind::Docker, PathBuf::from(DOCKER_SOCKET)));
    candidates
}

fn current_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        status
            .lines()
            .find_map(|l| l.strip_prefix("Uid:"))
            .and_then(|rest| rest.split_whitespace().next())
            .map(str::to_string)
    })
}

fn default_socket(kind: EngineKind) -> &'static str {
    match kind {
        EngineKind::Docker => DOCKER_SOCKET,
        EngineKind::Podman => ROOTFUL_PODMAN,
    }
}
