// ABOUTME: TLS section of hubstack.yml: domain, DNS token, certificate files, issuance agent.
// ABOUTME: Relative paths resolve against the app base directory.

use super::EnvValue;
use crate::cert::DEFAULT_TRUSTED_ISSUERS;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// Domain to issue for. Falls back to the secrets file.
    #[serde(default)]
    pub domain: Option<String>,

    /// DNS provider token. Falls back to the secrets file.
    #[serde(default)]
    pub dns_token: Option<EnvValue>,

    #[serde(default = "default_dns_hook")]
    pub dns_hook: String,

    #[serde(default = "default_cert_dir")]
    pub cert_dir: PathBuf,

    #[serde(default = "default_cert_file")]
    pub cert_file: String,

    #[serde(default = "default_key_file")]
    pub key_file: String,

    /// Existing certificates with more than this left are kept as-is.
    #[serde(default = "default_min_remaining", with = "humantime_serde")]
    pub min_remaining: Duration,

    /// `cert status` flags renewal as due inside this window.
    #[serde(default = "default_min_remaining", with = "humantime_serde")]
    pub renewal_margin: Duration,

    #[serde(default = "default_self_signed_days")]
    pub self_signed_days: u32,

    #[serde(default = "default_acme_image")]
    pub acme_image: String,

    #[serde(default = "default_acme_server")]
    pub acme_server: String,

    /// acme.sh state directory.
    #[serde(default = "default_acme_work_dir")]
    pub acme_work_dir: PathBuf,

    #[serde(default = "default_trusted_issuers")]
    pub trusted_issuers: Vec<String>,

    #[serde(default = "default_local_issuer_marker")]
    pub local_issuer_marker: String,

    /// Single-slot backup area. Must live outside every directory revert deletes.
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,

    /// Issuance agent log, relative to the certificate directory.
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            domain: None,
            dns_token: None,
            dns_hook: default_dns_hook(),
            cert_dir: default_cert_dir(),
            cert_file: default_cert_file(),
            key_file: default_key_file(),
            min_remaining: default_min_remaining(),
            renewal_margin: default_min_remaining(),
            self_signed_days: default_self_signed_days(),
            acme_image: default_acme_image(),
            acme_server: default_acme_server(),
            acme_work_dir: default_acme_work_dir(),
            trusted_issuers: default_trusted_issuers(),
            local_issuer_marker: default_local_issuer_marker(),
            backup_dir: None,
            log_file: default_log_file(),
        }
    }
}

fn default_dns_hook() -> String {
    "dns_desec".to_string()
}

fn default_cert_dir() -> PathBuf {
    PathBuf::from("data/adguard/conf")
}

fn default_cert_file() -> String {
    "ssl.crt".to_string()
}

fn default_key_file() -> String {
    "ssl.key".to_string()
}

fn default_min_remaining() -> Duration {
    Duration::from_secs(30 * 24 * 60 * 60)
}

fn default_self_signed_days() -> u32 {
    365
}

fn default_acme_image() -> String {
    "neilpang/acme.sh".to_string()
}

fn default_acme_server() -> String {
    "letsencrypt".to_string()
}

fn default_acme_work_dir() -> PathBuf {
    PathBuf::from(".acme")
}

fn default_trusted_issuers() -> Vec<String> {
    DEFAULT_TRUSTED_ISSUERS.iter().map(|s| s.to_string()).collect()
}

fn default_local_issuer_marker() -> String {
    "hubstack".to_string()
}

fn default_log_file() -> String {
    "last_run.log".to_string()
}
