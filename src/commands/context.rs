// ABOUTME: Per-invocation host context: config, secrets, and the host-side adapters.
// ABOUTME: Commands build their orchestrators from it.

use hubstack::cert::{AcmeShContainer, CertificateStore, IssuancePolicy, OpensslCli};
use hubstack::config::{Config, Secrets};
use hubstack::dns::DesecClient;
use hubstack::error::Result;
use hubstack::firewall::Iptables;
use hubstack::output::Output;
use hubstack::prompt::{Prompter, prompter_for};
use hubstack::runtime::{BollardRuntime, connect_local};
use hubstack::schedule::Crontab;
use hubstack::slot::{SlotManager, SlotStore};
use std::path::Path;
use std::sync::Arc;

pub struct Host {
    pub config: Config,
    pub secrets: Secrets,
    pub certs: CertificateStore,
    pub scheduler: Crontab,
    pub firewall: Iptables,
    pub prompter: Box<dyn Prompter>,
}

impl Host {
    /// Load the config (explicit path or discovery) and the secrets file next to it.
    pub fn open(config_path: Option<&Path>, auto_confirm: bool) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load(path)?,
            None => Config::discover(&std::env::current_dir()?)?,
        };
        let secrets = Secrets::load(&config.secrets_file())?;
        let certs = CertificateStore::new(
            config.cert_paths(),
            Arc::new(OpensslCli::new()),
            config.issuer_matcher(),
        );
        Ok(Self {
            config,
            secrets,
            certs,
            scheduler: Crontab::new(),
            firewall: Iptables::new(),
            prompter: prompter_for(auto_confirm),
        })
    }

    /// Detect and connect to the local engine.
    pub async fn engine(&self, output: &Output) -> Result<BollardRuntime> {
        output.progress("  → Connecting to container engine...");
        let runtime = connect_local(&self.config.engine).await?;
        output.progress(&format!("  → Found {}", runtime.kind().display_name()));
        Ok(runtime)
    }

    pub fn domain(&self) -> Option<String> {
        self.config.domain(&self.secrets)
    }

    /// DNS client, when a token is configured.
    pub fn dns(&self) -> Result<Option<DesecClient>> {
        let Some(token) = self.config.dns_token(&self.secrets) else {
            return Ok(None);
        };
        let dns = &self.config.dns;
        Ok(Some(DesecClient::new(
            dns.api_base.clone(),
            dns.public_ip_url.clone(),
            token,
            dns.timeout,
        )?))
    }

    pub fn acme_agent(&self) -> AcmeShContainer {
        let tls = &self.config.tls;
        AcmeShContainer::new(
            self.config.manifest.engine_cli.clone(),
            tls.acme_image.clone(),
            tls.acme_server.clone(),
            self.config.acme_work_dir(),
            self.config.cert_log_path(),
        )
    }

    pub fn issuance_policy(&self) -> IssuancePolicy {
        self.config.issuance_policy(&self.secrets, self.retry_command())
    }

    pub fn slots(&self) -> Result<SlotManager> {
        Ok(SlotManager::open(
            SlotStore::new(self.config.slot_file()),
            self.config.backup_spec(),
            self.config.app.container_prefix.clone(),
        )?)
    }

    /// Command the scheduled certificate retry runs: this binary, same config, unattended.
    fn retry_command(&self) -> String {
        let exe = std::env::current_exe()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "hubstack".to_string());
        let mut command = format!("{exe} -y");
        if let Some(ref source) = self.config.source {
            command.push_str(&format!(" --config {}", source.display()));
        }
        command.push_str(" cert renew");
        command
    }
}
