// ABOUTME: Bounded readiness polling for freshly started containers.
// ABOUTME: A timeout is a warning, never a failure.

use crate::diagnostics::{Diagnostics, Warning};
use crate::runtime::ContainerOps;
use crate::types::ContainerName;
use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;

/// How long to wait: `ticks` checks, `interval` apart.
#[derive(Debug, Clone, Copy)]
pub struct HealthPolicy {
    pub ticks: u32,
    pub interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "health", rename_all = "snake_case")]
pub enum HealthOutcome {
    /// Nothing to wait for.
    Skipped,
    Ready { ticks: u32 },
    TimedOut { pending: Vec<String> },
}

impl HealthOutcome {
    pub fn is_ready(&self) -> bool {
        !matches!(self, HealthOutcome::TimedOut { .. })
    }
}

/// Poll until every container is ready or the ticks run out.
///
/// Containers that cannot be inspected count as not ready.
pub async fn wait_until_ready<R: ContainerOps + ?Sized>(
    runtime: &R,
    containers: &[ContainerName],
    policy: HealthPolicy,
    diag: &mut Diagnostics,
) -> HealthOutcome {
    if containers.is_empty() {
        return HealthOutcome::Skipped;
    }

    let mut pending: Vec<&ContainerName> = containers.iter().collect();
    for tick in 1..=policy.ticks.max(1) {
        let checks = join_all(pending.iter().map(|name| runtime.inspect_container(name))).await;
        pending = pending
            .into_iter()
            .zip(checks)
            .filter(|(_, check)| !matches!(check, Ok(info) if info.is_ready()))
            .map(|(name, _)| name)
            .collect();

        if pending.is_empty() {
            tracing::info!("{} container(s) ready after {tick} tick(s)", containers.len());
            return HealthOutcome::Ready { ticks: tick };
        }
        tracing::debug!(pending = pending.len(), "waiting for containers, tick {tick}");
        if tick < policy.ticks {
            tokio::time::sleep(policy.interval).await;
        }
    }

    let pending: Vec<String> = pending.iter().map(|n| n.to_string()).collect();
    diag.warn(Warning::health_timeout(format!(
        "not ready after {} check(s): {}",
        policy.ticks,
        pending.join(", ")
    )));
    HealthOutcome::TimedOut { pending }
}
