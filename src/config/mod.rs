// ABOUTME: Configuration types and parsing for hubstack.yml.
// ABOUTME: Handles YAML parsing, env var interpolation, defaults, and derived paths.

mod deserialize;
mod env_value;
mod init;
mod secrets;
mod tls;

pub use env_value::{EnvRef, EnvValue};
pub use init::init_config;
pub use secrets::{DOMAIN_KEY, Secrets, TOKEN_KEY};
pub use tls::TlsConfig;

use crate::cert::{CertificatePaths, IssuancePolicy, IssuerMatcher};
use crate::cleanup::{CleanupPlan, MatchRule, RuleSet};
use crate::error::{Error, Result};
use crate::firewall::FirewallRule;
use crate::runtime::EngineConfig;
use crate::slot::BackupSpec;
use crate::types::ServiceName;
use deserialize::{deserialize_service_list, deserialize_services};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "hubstack.yml";
pub const CONFIG_FILENAME_ALT: &str = "hubstack.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".hubstack/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,

    #[serde(deserialize_with = "deserialize_services")]
    pub services: NonEmpty<ServiceName>,

    /// Services started and health-gated before the rest.
    #[serde(default, deserialize_with = "deserialize_service_list")]
    pub infra_critical: Vec<ServiceName>,

    /// Image references this deployment pulls; revert removes them.
    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub cleanup: CleanupConfig,

    #[serde(default)]
    pub tls: TlsConfig,

    #[serde(default)]
    pub dns: DnsConfig,

    #[serde(default)]
    pub health: HealthConfig,

    /// Control surface probed after deployment.
    #[serde(default)]
    pub control_url: Option<String>,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub firewall: FirewallConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub manifest: ManifestConfig,

    /// File this config was loaded from.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,

    pub base_dir: PathBuf,

    #[serde(default = "default_container_prefix")]
    pub container_prefix: String,

    #[serde(default = "default_slot_file")]
    pub slot_file: PathBuf,

    #[serde(default = "default_secrets_file")]
    pub secrets_file: PathBuf,

    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_sources_dir")]
    pub sources_dir: PathBuf,

    /// Pre-swap backup archives.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
}

fn default_container_prefix() -> String {
    "dhi".to_string()
}

fn default_slot_file() -> PathBuf {
    PathBuf::from(".active_slot")
}

fn default_secrets_file() -> PathBuf {
    PathBuf::from(".secrets")
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("config")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_sources_dir() -> PathBuf {
    PathBuf::from("sources")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// Containers outside the service list that belong to this deployment.
    #[serde(default)]
    pub containers: Vec<MatchRule>,

    /// Defaults to `<prefix>_` and `<app>_` prefixes.
    #[serde(default)]
    pub volumes: Vec<MatchRule>,

    /// Defaults to the container prefix.
    #[serde(default)]
    pub networks: Vec<MatchRule>,

    /// Networks never removed, on top of the engine's own.
    #[serde(default)]
    pub reserved_networks: Vec<String>,

    /// Additional paths revert deletes.
    #[serde(default)]
    pub extra_dirs: Vec<PathBuf>,

    #[serde(default = "default_stop_timeout", with = "humantime_serde")]
    pub stop_timeout: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            containers: Vec::new(),
            volumes: Vec::new(),
            networks: Vec::new(),
            reserved_networks: Vec::new(),
            extra_dirs: Vec::new(),
            stop_timeout: default_stop_timeout(),
        }
    }
}

fn default_stop_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Clone, Deserialize)]
pub struct DnsConfig {
    #[serde(default = "default_dns_api_base")]
    pub api_base: String,

    #[serde(default = "default_public_ip_url")]
    pub public_ip_url: String,

    #[serde(default = "default_dns_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            api_base: default_dns_api_base(),
            public_ip_url: default_public_ip_url(),
            timeout: default_dns_timeout(),
        }
    }
}

fn default_dns_api_base() -> String {
    "https://desec.io/api/v1".to_string()
}

fn default_public_ip_url() -> String {
    "https://api.ipify.org".to_string()
}

fn default_dns_timeout() -> Duration {
    Duration::from_secs(15)
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_health_ticks")]
    pub ticks: u32,

    #[serde(default = "default_health_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Timeout of the post-deploy reachability probe.
    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub probe_timeout: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            ticks: default_health_ticks(),
            interval: default_health_interval(),
            probe_timeout: default_probe_timeout(),
        }
    }
}

fn default_health_ticks() -> u32 {
    30
}

fn default_health_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Substring that marks scheduled entries as ours.
    #[serde(default = "default_schedule_marker")]
    pub marker: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            marker: default_schedule_marker(),
        }
    }
}

fn default_schedule_marker() -> String {
    "hubstack-managed".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirewallConfig {
    /// Exact rules this deployment adds; revert deletes exactly these.
    #[serde(default)]
    pub rules: Vec<FirewallRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestConfig {
    /// Rendered compose file, relative to the base directory.
    #[serde(default = "default_manifest_file")]
    pub file: PathBuf,

    /// Engine CLI used for `compose` and the issuance agent container.
    #[serde(default = "default_engine_cli")]
    pub engine_cli: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            file: default_manifest_file(),
            engine_cli: default_engine_cli(),
        }
    }
}

fn default_manifest_file() -> PathBuf {
    PathBuf::from("docker-compose.yml")
}

fn default_engine_cli() -> String {
    "docker".to_string()
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn validate(&self) -> Result<()> {
        let prefix = &self.app.container_prefix;
        if prefix.is_empty()
            || !prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::InvalidConfig(format!(
                "container_prefix '{prefix}' must be non-empty and use only letters, digits, '-' or '_'"
            )));
        }

        if let Some(unknown) = self
            .infra_critical
            .iter()
            .find(|s| !self.services.iter().any(|known| known == *s))
        {
            return Err(Error::InvalidConfig(format!(
                "infra_critical service '{unknown}' is not listed in services"
            )));
        }

        let backup = self.cert_backup_dir();
        if let Some(doomed) = self.state_paths().iter().find(|p| backup.starts_with(p)) {
            return Err(Error::InvalidConfig(format!(
                "tls.backup_dir {} lies inside {}, which revert deletes",
                backup.display(),
                doomed.display()
            )));
        }

        Ok(())
    }

    /// Resolve a path against the base directory. Absolute paths stay as they are.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.app.base_dir.join(path)
    }

    pub fn slot_file(&self) -> PathBuf {
        self.resolve(&self.app.slot_file)
    }

    pub fn secrets_file(&self) -> PathBuf {
        self.resolve(&self.app.secrets_file)
    }

    pub fn config_dir(&self) -> PathBuf {
        self.resolve(&self.app.config_dir)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.resolve(&self.app.data_dir)
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.resolve(&self.app.sources_dir)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.resolve(&self.app.backup_dir)
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.resolve(&self.manifest.file)
    }

    pub fn acme_work_dir(&self) -> PathBuf {
        self.resolve(&self.tls.acme_work_dir)
    }

    pub fn cert_dir(&self) -> PathBuf {
        self.resolve(&self.tls.cert_dir)
    }

    pub fn cert_log_path(&self) -> PathBuf {
        self.cert_dir().join(&self.tls.log_file)
    }

    pub fn cert_backup_dir(&self) -> PathBuf {
        match &self.tls.backup_dir {
            Some(dir) => self.resolve(dir),
            None => std::env::temp_dir().join(format!("{}-cert-backup", self.app.name)),
        }
    }

    pub fn cert_paths(&self) -> CertificatePaths {
        let dir = self.cert_dir();
        CertificatePaths {
            cert: dir.join(&self.tls.cert_file),
            key: dir.join(&self.tls.key_file),
            backup_dir: self.cert_backup_dir(),
        }
    }

    pub fn issuer_matcher(&self) -> IssuerMatcher {
        IssuerMatcher::new(
            self.tls.trusted_issuers.clone(),
            self.tls.local_issuer_marker.clone(),
        )
    }

    /// Everything revert deletes from disk.
    pub fn state_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![
            self.config_dir(),
            self.data_dir(),
            self.sources_dir(),
            self.backup_dir(),
            self.acme_work_dir(),
            self.slot_file(),
            self.secrets_file(),
        ];
        paths.extend(self.cleanup.extra_dirs.iter().map(|p| self.resolve(p)));
        paths
    }

    /// Pre-swap backup: config and secrets, never bulk data or sources.
    pub fn backup_spec(&self) -> BackupSpec {
        BackupSpec {
            root: self.app.base_dir.clone(),
            include: vec![self.config_dir(), self.secrets_file(), self.slot_file()],
            exclude: vec![self.data_dir(), self.sources_dir(), self.backup_dir()],
            dest_dir: self.backup_dir(),
        }
    }

    /// Domain from the config, else from the secrets file.
    pub fn domain(&self, secrets: &Secrets) -> Option<String> {
        self.tls
            .domain
            .clone()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| secrets.domain().map(str::to_string))
    }

    /// DNS token from the config, else from the secrets file.
    pub fn dns_token(&self, secrets: &Secrets) -> Option<String> {
        self.tls
            .dns_token
            .as_ref()
            .and_then(EnvValue::resolve_optional)
            .or_else(|| secrets.token().map(str::to_string))
    }

    /// Scheduled-task marker for the certificate retry entry.
    pub fn retry_marker(&self) -> String {
        format!("{}:cert-retry", self.schedule.marker)
    }

    pub fn issuance_policy(&self, secrets: &Secrets, retry_command: String) -> IssuancePolicy {
        let domain = self.domain(secrets);
        IssuancePolicy {
            fallback_name: domain
                .clone()
                .unwrap_or_else(|| format!("{}.local", self.app.name)),
            domain,
            dns_token: self.dns_token(secrets),
            dns_hook: self.tls.dns_hook.clone(),
            min_remaining: self.tls.min_remaining,
            self_signed_days: self.tls.self_signed_days,
            retry_marker: self.retry_marker(),
            retry_command,
        }
    }

    pub fn cleanup_plan(&self, domain: Option<String>) -> CleanupPlan {
        let prefix = &self.app.container_prefix;
        let volumes = if self.cleanup.volumes.is_empty() {
            vec![
                MatchRule::Prefixed(format!("{prefix}_")),
                MatchRule::Prefixed(format!("{}_", self.app.name)),
            ]
        } else {
            self.cleanup.volumes.clone()
        };
        let networks = if self.cleanup.networks.is_empty() {
            vec![MatchRule::Prefixed(prefix.clone())]
        } else {
            self.cleanup.networks.clone()
        };

        CleanupPlan {
            app_name: self.app.name.clone(),
            services: self.services.iter().cloned().collect(),
            container_prefix: prefix.clone(),
            extra_containers: self.cleanup.containers.clone(),
            volumes: RuleSet::new(volumes),
            networks: RuleSet::for_networks(networks, &self.cleanup.reserved_networks),
            images: self.images.clone(),
            data_dir: self.data_dir(),
            state_paths: self.state_paths(),
            schedule_marker: self.schedule.marker.clone(),
            firewall_rules: self.firewall.rules.clone(),
            domain,
            stop_timeout: self.cleanup.stop_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "app:\n  name: hub\n  base_dir: /srv/hub\nservices: [adguard, memos]\n";

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.app.container_prefix, "dhi");
        assert_eq!(config.slot_file(), PathBuf::from("/srv/hub/.active_slot"));
        assert_eq!(
            config.cert_paths().cert,
            PathBuf::from("/srv/hub/data/adguard/conf/ssl.crt")
        );
        assert_eq!(config.tls.min_remaining, Duration::from_secs(30 * 86400));
        assert_eq!(config.health.ticks, 30);
        assert_eq!(config.retry_marker(), "hubstack-managed:cert-retry");
    }

    #[test]
    fn empty_service_list_is_rejected() {
        let yaml = "app:\n  name: hub\n  base_dir: /srv/hub\nservices: []\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn infra_critical_must_be_known() {
        let yaml = format!("{MINIMAL}infra_critical: [unbound]\n");
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("unbound"));
    }

    #[test]
    fn backup_inside_state_is_rejected() {
        let yaml = format!("{MINIMAL}tls:\n  backup_dir: data/cert-backup\n");
        assert!(matches!(
            Config::from_yaml(&yaml),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn domain_falls_back_to_secrets() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        let secrets = Secrets::parse("DESEC_DOMAIN=hub.example.org\nDESEC_TOKEN=t0k");
        assert_eq!(config.domain(&secrets).as_deref(), Some("hub.example.org"));
        assert_eq!(config.dns_token(&secrets).as_deref(), Some("t0k"));

        let policy = config.issuance_policy(&secrets, "hubstack -y cert renew".into());
        assert_eq!(policy.fallback_name, "hub.example.org");

        let policy = config.issuance_policy(&Secrets::default(), String::new());
        assert_eq!(policy.fallback_name, "hub.local");
        assert!(policy.domain.is_none());
    }

    #[test]
    fn default_cleanup_rules_follow_prefix() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        let plan = config.cleanup_plan(None);
        assert!(plan.volumes.matches("dhi_memos"));
        assert!(plan.volumes.matches("hub_data"));
        assert!(!plan.volumes.matches("portainer_data"));
        assert!(plan.networks.matches("dhi_frontend"));
        assert!(!plan.networks.matches("bridge"));
        assert!(plan.state_paths.contains(&PathBuf::from("/srv/hub/.secrets")));
    }

    #[test]
    fn backup_spec_skips_bulk_data() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        let spec = config.backup_spec();
        assert!(spec.include.contains(&PathBuf::from("/srv/hub/config")));
        assert!(spec.include.contains(&PathBuf::from("/srv/hub/.secrets")));
        assert!(spec.exclude.contains(&PathBuf::from("/srv/hub/data")));
        assert!(spec.exclude.contains(&PathBuf::from("/srv/hub/sources")));
        assert_eq!(spec.dest_dir, PathBuf::from("/srv/hub/backups"));
    }
}
