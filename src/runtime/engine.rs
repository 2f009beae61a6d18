// ABOUTME: Which container engine hubstack talks to, and through which socket.
// ABOUTME: Read from the `engine` section of hubstack.yml; an empty section means autodetect.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Docker,
    Podman,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Docker => "docker",
            EngineKind::Podman => "podman",
        }
    }

    /// Name shown to humans and reported by `RuntimeInfo::info`.
    pub fn display_name(self) -> &'static str {
        match self {
            EngineKind::Docker => "Docker",
            EngineKind::Podman => "Podman",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A socket an engine answers on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSocket {
    pub kind: EngineKind,
    pub path: PathBuf,
}

/// `engine:` section. Both fields are optional overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub kind: Option<EngineKind>,
    #[serde(default)]
    pub socket: Option<PathBuf>,
}
