// ABOUTME: Container engine client: detection, capability traits, bollard implementation.
// ABOUTME: Everything the orchestrators ask of Docker or Podman goes through here.

mod bollard;
mod detection;
mod engine;
mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod traits;

pub use self::bollard::BollardRuntime;
pub use detection::detect_local;
pub use engine::{EngineConfig, EngineKind, EngineSocket};
pub use error::RuntimeError;
pub use traits::*;

use error::{ConnectSnafu, UnresponsiveSnafu};
use snafu::ResultExt;

/// Detect the local engine, connect, and make sure it answers.
pub async fn connect_local(config: &EngineConfig) -> Result<BollardRuntime, RuntimeError> {
    let socket = detect_local(config)?;
    tracing::debug!("connecting to {} at {}", socket.kind, socket.path.display());
    let runtime = BollardRuntime::connect(&socket).context(ConnectSnafu {
        kind: socket.kind,
        path: socket.path.clone(),
    })?;
    runtime.ping().await.context(UnresponsiveSnafu {
        kind: socket.kind,
        path: socket.path.clone(),
    })?;
    Ok(runtime)
}
