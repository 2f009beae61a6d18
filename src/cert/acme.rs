// ABOUTME: External ACME agent that performs DNS-01 issuance.
// ABOUTME: Production agent runs acme.sh in a throwaway container; failures come back typed.

use crate::process::HostCommand;
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// What the agent is asked to do.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub domain: String,
    pub dns_token: String,
    /// acme.sh DNS hook, e.g. `dns_desec`.
    pub dns_hook: String,
}

/// Freshly issued files, outside the managed certificate path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCertificate {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// The issuer refused because of its rate limit.
    RateLimited { retry_after: Option<String> },
    /// The DNS challenge could not be verified.
    VerificationFailed,
    /// The DNS provider rejected the token.
    AuthError,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::RateLimited { .. } => f.write_str("rate limited"),
            FailureKind::VerificationFailed => f.write_str("challenge verification failed"),
            FailureKind::AuthError => f.write_str("DNS provider authentication failed"),
            FailureKind::Other => f.write_str("issuance failed"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind}: {detail}")]
pub struct IssuanceFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl IssuanceFailure {
    pub fn other(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Other,
            detail: detail.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self.kind, FailureKind::RateLimited { .. })
    }
}

static RETRY_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)retry\s+after[:\s]+[^\n]+").expect("valid regex"));

/// Classify an agent log. `None` when the log shows no known failure.
pub fn classify_log(log: &str) -> Option<FailureKind> {
    let lower = log.to_lowercase();
    if lower.contains("rate limit") || lower.contains("too many certificates") {
        let retry_after = RETRY_TEXT_RE
            .find(log)
            .map(|m| m.as_str().trim().to_string());
        return Some(FailureKind::RateLimited { retry_after });
    }
    if lower.contains("invalid token") {
        return Some(FailureKind::AuthError);
    }
    if lower.contains("verify error") || lower.contains("challenge failed") {
        return Some(FailureKind::VerificationFailed);
    }
    None
}

/// Last line worth showing from a log.
fn last_meaningful_line(log: &str) -> String {
    log.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no output")
        .to_string()
}

#[async_trait]
pub trait AcmeAgent: Send + Sync {
    async fn issue(&self, request: &IssueRequest) -> Result<IssuedCertificate, IssuanceFailure>;
}

/// acme.sh run through the container engine CLI (`docker run --rm`).
#[derive(Debug, Clone)]
pub struct AcmeShContainer {
    engine_cli: String,
    image: String,
    server: String,
    /// Holds acme.sh account state and issued output between runs.
    work_dir: PathBuf,
    /// Combined output of the last run.
    log_path: PathBuf,
}

impl AcmeShContainer {
    pub fn new(
        engine_cli: impl Into<String>,
        image: impl Into<String>,
        server: impl Into<String>,
        work_dir: impl Into<PathBuf>,
        log_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine_cli: engine_cli.into(),
            image: image.into(),
            server: server.into(),
            work_dir: work_dir.into(),
            log_path: log_path.into(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.work_dir.join("acme")
    }

    fn out_dir(&self) -> PathBuf {
        self.work_dir.join("out")
    }

    fn container(&self, request: &IssueRequest) -> HostCommand {
        HostCommand::new(&self.engine_cli)
            .args(["run", "--rm", "-e", "DESEC_TOKEN", "-v"])
            .arg(format!("{}:/acme.sh", self.state_dir().display()))
            .arg("-v")
            .arg(format!("{}:/out", self.out_dir().display()))
            .arg(&self.image)
            // Forwarded from our environment so the token never appears in argv.
            .env("DESEC_TOKEN", &request.dns_token)
    }

    fn issue_command(&self, request: &IssueRequest) -> HostCommand {
        let wildcard = format!("*.{}", request.domain);
        self.container(request)
            .args(["--issue", "--force", "--keylength", "2048", "--dns"])
            .arg(&request.dns_hook)
            .args(["-d", request.domain.as_str(), "-d", wildcard.as_str()])
            .args(["--server", self.server.as_str()])
    }

    fn install_command(&self, request: &IssueRequest) -> HostCommand {
        self.container(request)
            .args(["--install-cert", "-d", request.domain.as_str()])
            .args(["--key-file", "/out/ssl.key", "--fullchain-file", "/out/ssl.crt"])
    }

    fn write_log(&self, text: &str) {
        if let Some(dir) = self.log_path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Err(e) = std::fs::write(&self.log_path, text) {
            tracing::warn!("failed to write {}: {}", self.log_path.display(), e);
        }
    }

    async fn run_logged(
        &self,
        cmd: HostCommand,
        log: &mut String,
    ) -> Result<(), IssuanceFailure> {
        let out = cmd
            .run()
            .await
            .map_err(|e| IssuanceFailure::other(format!("{}: {}", cmd.display(), e)))?;
        log.push_str(&out.combined());
        if out.success {
            Ok(())
        } else {
            Err(IssuanceFailure {
                kind: classify_log(log).unwrap_or(FailureKind::Other),
                detail: last_meaningful_line(log),
            })
        }
    }
}

#[async_trait]
impl AcmeAgent for AcmeShContainer {
    async fn issue(&self, request: &IssueRequest) -> Result<IssuedCertificate, IssuanceFailure> {
        for dir in [self.state_dir(), self.out_dir()] {
            std::fs::create_dir_all(&dir)
                .map_err(|e| IssuanceFailure::other(format!("{}: {}", dir.display(), e)))?;
        }

        tracing::info!("requesting certificate for {} and *.{}", request.domain, request.domain);
        let mut log = String::new();
        let result = async {
            self.run_logged(self.issue_command(request), &mut log).await?;
            self.run_logged(self.install_command(request), &mut log).await
        }
        .await;
        self.write_log(&log);
        result?;

        let issued = IssuedCertificate {
            cert: self.out_dir().join("ssl.crt"),
            key: self.out_dir().join("ssl.key"),
        };
        if !exists(&issued.cert) || !exists(&issued.key) {
            return Err(IssuanceFailure::other(format!(
                "agent reported success but {} is missing",
                self.out_dir().display()
            )));
        }
        Ok(issued)
    }
}

fn exists(path: &Path) -> bool {
    path.is_file()
}
