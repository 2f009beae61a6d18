// ABOUTME: deSEC DNS API client.
// ABOUTME: PATCHes the apex and wildcard A/AAAA rrsets of a domain.

use super::{DnsError, DnsProvider, response_confirms};
use async_trait::async_trait;
use serde::Serialize;
use std::net::IpAddr;
use std::time::Duration;

/// Record TTL; deSEC's minimum.
const RECORD_TTL: u32 = 3600;

pub struct DesecClient {
    client: reqwest::Client,
    api_base: String,
    public_ip_url: String,
    token: String,
}

#[derive(Debug, Serialize)]
struct RrSet<'a> {
    subname: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    ttl: u32,
    records: Vec<String>,
}

impl DesecClient {
    pub fn new(
        api_base: impl Into<String>,
        public_ip_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DnsError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DnsError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            public_ip_url: public_ip_url.into(),
            token: token.into(),
        })
    }

    fn rrsets_url(&self, domain: &str) -> String {
        format!("{}/domains/{}/rrsets/", self.api_base, domain)
    }
}

fn record_type(ip: IpAddr) -> &'static str {
    match ip {
        IpAddr::V4(_) => "A",
        IpAddr::V6(_) => "AAAA",
    }
}

#[async_trait]
impl DnsProvider for DesecClient {
    async fn public_ip(&self) -> Result<IpAddr, DnsError> {
        let body = self
            .client
            .get(&self.public_ip_url)
            .send()
            .await
            .map_err(|e| DnsError::PublicIp(e.to_string()))?
            .text()
            .await
            .map_err(|e| DnsError::PublicIp(e.to_string()))?;

        body.trim()
            .parse()
            .map_err(|_| DnsError::PublicIp(format!("not an IP address: {:?}", body.trim())))
    }

    async fn update_records(&self, domain: &str, ip: IpAddr) -> Result<(), DnsError> {
        let rrsets = ["", "*"].map(|subname| RrSet {
            subname,
            record_type: record_type(ip),
            ttl: RECORD_TTL,
            records: vec![ip.to_string()],
        });

        let response = self
            .client
            .patch(self.rrsets_url(domain))
            .header("Authorization", format!("Token {}", self.token))
            .json(&rrsets)
            .send()
            .await
            .map_err(|e| DnsError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DnsError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(DnsError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        if !response_confirms(&body, ip) {
            return Err(DnsError::Unconfirmed { ip, body });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rrsets_url_strips_trailing_slash() {
        let client = DesecClient::new(
            "https://desec.io/api/v1/",
            "https://api.ipify.org",
            "t",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.rrsets_url("example.org"),
            "https://desec.io/api/v1/domains/example.org/rrsets/"
        );
    }

    #[test]
    fn rrset_body_shape() {
        let set = RrSet {
            subname: "*",
            record_type: record_type(IpAddr::from([192, 0, 2, 1])),
            ttl: RECORD_TTL,
            records: vec!["192.0.2.1".to_string()],
        };
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"{"subname":"*","type":"A","ttl":3600,"records":["192.0.2.1"]}"#
        );
    }

    #[test]
    fn ipv6_uses_aaaa() {
        assert_eq!(record_type("2001:db8::1".parse().unwrap()), "AAAA");
    }
}
