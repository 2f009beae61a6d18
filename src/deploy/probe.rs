// ABOUTME: Post-deploy reachability check of the control surface.
// ABOUTME: The result is only reported; it never fails a deployment.

use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reachability", rename_all = "snake_case")]
pub enum Reachability {
    NotConfigured,
    Reachable,
    HttpStatus { code: u16 },
    Unreachable { reason: String },
}

impl std::fmt::Display for Reachability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reachability::NotConfigured => write!(f, "not configured"),
            Reachability::Reachable => write!(f, "reachable"),
            Reachability::HttpStatus { code } => write!(f, "answered with HTTP {code}"),
            Reachability::Unreachable { reason } => write!(f, "unreachable ({reason})"),
        }
    }
}

/// GET `url` once. Certificate errors are ignored since the stack may be self-signed.
pub async fn probe(url: Option<&str>, timeout: Duration) -> Reachability {
    let Some(url) = url else {
        return Reachability::NotConfigured;
    };

    let client = match reqwest::Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(true)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return Reachability::Unreachable {
                reason: e.to_string(),
            };
        }
    };

    let result = match client.get(url).send().await {
        Ok(response) if response.status().is_success() => Reachability::Reachable,
        Ok(response) => Reachability::HttpStatus {
            code: response.status().as_u16(),
        },
        Err(e) if e.is_timeout() => Reachability::Unreachable {
            reason: "timed out".to_string(),
        },
        Err(e) if e.is_connect() => Reachability::Unreachable {
            reason: "connection refused".to_string(),
        },
        Err(e) => Reachability::Unreachable {
            reason: e.to_string(),
        },
    };
    tracing::info!("control surface {url}: {result}");
    result
}
