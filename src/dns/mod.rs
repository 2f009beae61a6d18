// ABOUTME: DNS provider interface used before DNS-01 issuance.
// ABOUTME: Points the apex and wildcard records at this host's public address.

mod desec;

pub use desec::DesecClient;

use async_trait::async_trait;
use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("failed to discover public IP: {0}")]
    PublicIp(String),

    #[error("DNS API request failed: {0}")]
    Transport(String),

    #[error("DNS API rejected update ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("DNS API response did not confirm {ip}: {body}")]
    Unconfirmed { ip: IpAddr, body: String },
}

#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// This host's address as seen from the internet.
    async fn public_ip(&self) -> Result<IpAddr, DnsError>;

    /// Point `domain` and `*.domain` at `ip`.
    async fn update_records(&self, domain: &str, ip: IpAddr) -> Result<(), DnsError>;

    /// Discover the public address and publish it. Returns the address used.
    async fn point_at_this_host(&self, domain: &str) -> Result<IpAddr, DnsError> {
        let ip = self.public_ip().await?;
        self.update_records(domain, ip).await?;
        tracing::info!("DNS for {} and *.{} now points at {}", domain, domain, ip);
        Ok(ip)
    }
}

/// Does an update response confirm the submitted address?
///
/// Accepts a body that echoes the IP, an empty body, or a JSON body shaped like
/// record sets (an array of objects, or an object with `records`).
pub fn response_confirms(body: &str, ip: IpAddr) -> bool {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.contains(&ip.to_string()) {
        return true;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Array(items)) => items.iter().all(|i| i.is_object()),
        Ok(serde_json::Value::Object(map)) => map.contains_key("records"),
        _ => false,
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::{DnsError, DnsProvider};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::net::IpAddr;

    #[derive(Debug)]
    pub(crate) struct FakeDns {
        ip: IpAddr,
        fail: bool,
        updates: Mutex<Vec<(String, IpAddr)>>,
    }

    impl FakeDns {
        pub(crate) fn working() -> Self {
            Self {
                ip: IpAddr::from([203, 0, 113, 7]),
                fail: false,
                updates: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::working()
            }
        }

        pub(crate) fn updates(&self) -> Vec<(String, IpAddr)> {
            self.updates.lock().clone()
        }
    }

    #[async_trait]
    impl DnsProvider for FakeDns {
        async fn public_ip(&self) -> Result<IpAddr, DnsError> {
            if self.fail {
                return Err(DnsError::PublicIp("network unreachable".to_string()));
            }
            Ok(self.ip)
        }

        async fn update_records(&self, domain: &str, ip: IpAddr) -> Result<(), DnsError> {
            self.updates.lock().push((domain.to_string(), ip));
            Ok(())
        }
    }
}
