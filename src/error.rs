// ABOUTME: Application-wide error type for hubstack.
// ABOUTME: Wraps per-concern errors and maps them onto the run-level taxonomy.

use crate::cert::CertError;
use crate::cleanup::CleanupError;
use crate::deploy::DeployError;
use crate::dns::DnsError;
use crate::firewall::FirewallError;
use crate::manifest::ManifestError;
use crate::prompt::PromptError;
use crate::runtime::RuntimeError;
use crate::schedule::ScheduleError;
use crate::slot::SlotError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("container engine: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("certificate: {0}")]
    Certificate(#[from] CertError),

    #[error("DNS: {0}")]
    Dns(#[from] DnsError),

    #[error("scheduled tasks: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("firewall: {0}")]
    Firewall(#[from] FirewallError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Cleanup(#[from] CleanupError),

    #[error("slot: {0}")]
    Slot(#[from] SlotError),

    #[error("manifest: {0}")]
    Manifest(#[from] ManifestError),

    #[error("deploy: {0}")]
    Deploy(#[from] DeployError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// How a failure affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Resource absent. Removals treat this as success.
    NotFound,
    /// Engine, DNS, issuer, or host tool unreachable or erroring.
    ExternalCallFailed,
    RateLimited,
    /// The operator answered "no".
    UserAborted,
    /// No TLS material or no usable deployment description can be produced.
    FatalConfiguration,
    Config,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AlreadyExists(_)
            | Error::ConfigNotFound(_)
            | Error::MissingEnvVar(_)
            | Error::InvalidConfig(_)
            | Error::Yaml(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
            Error::Runtime(e) if e.is_missing_engine() => ErrorKind::FatalConfiguration,
            Error::Runtime(_) | Error::Dns(_) | Error::Schedule(_) | Error::Firewall(_) => {
                ErrorKind::ExternalCallFailed
            }
            Error::Prompt(_) => ErrorKind::UserAborted,
            Error::Certificate(e) => cert_kind(e),
            Error::Cleanup(_) => ErrorKind::UserAborted,
            Error::Slot(e) => slot_kind(e),
            Error::Manifest(e) => manifest_kind(e),
            Error::Deploy(e) => match e {
                DeployError::Certificate(e) => cert_kind(e),
                DeployError::Cleanup(_) => ErrorKind::UserAborted,
                DeployError::Slot(e) => slot_kind(e),
                DeployError::Manifest(e) => manifest_kind(e),
            },
        }
    }

    /// Only an operator "no" or missing TLS/deployment material stops a run.
    pub fn halts_run(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UserAborted | ErrorKind::FatalConfiguration
        )
    }
}

fn cert_kind(e: &CertError) -> ErrorKind {
    if e.is_fatal() {
        ErrorKind::FatalConfiguration
    } else if matches!(e, CertError::Io { .. }) {
        ErrorKind::Io
    } else {
        ErrorKind::ExternalCallFailed
    }
}

fn slot_kind(e: &SlotError) -> ErrorKind {
    match e {
        SlotError::Corrupt { .. } => ErrorKind::Config,
        SlotError::Io { .. } | SlotError::Backup { .. } => ErrorKind::Io,
    }
}

fn manifest_kind(e: &ManifestError) -> ErrorKind {
    match e {
        ManifestError::Read { .. } | ManifestError::Parse { .. } => {
            ErrorKind::FatalConfiguration
        }
        ManifestError::Spawn { .. } | ManifestError::Failed { .. } => {
            ErrorKind::ExternalCallFailed
        }
    }
}
