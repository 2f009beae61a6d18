// ABOUTME: Certificate issuance state machine.
// ABOUTME: CheckExisting -> UpdateDns -> RequestAcme -> Install | ScheduleRetry -> SelfSigned -> Done.

use super::acme::{AcmeAgent, FailureKind, IssuanceFailure, IssueRequest, IssuedCertificate};
use super::classify::CertificateClass;
use super::error::CertError;
use super::rate_limit::{RateLimitWindow, parse_retry_after};
use super::store::CertificateStore;
use crate::diagnostics::{Diagnostics, Warning};
use crate::dns::DnsProvider;
use crate::schedule::{self, TaskScheduler};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Inputs that decide how a certificate is obtained.
#[derive(Debug, Clone)]
pub struct IssuancePolicy {
    pub domain: Option<String>,
    pub dns_token: Option<String>,
    /// acme.sh DNS hook name.
    pub dns_hook: String,
    /// An existing certificate with more than this left is kept.
    pub min_remaining: Duration,
    pub self_signed_days: u32,
    /// Common name for self-signed material when no domain is configured.
    pub fallback_name: String,
    /// Marker identifying the scheduled retry entry.
    pub retry_marker: String,
    /// Command the scheduled retry runs.
    pub retry_command: String,
}

/// Why a fallback was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No domain or no DNS token configured.
    NotConfigured,
    RateLimited,
    IssuanceFailed,
    InstallFailed,
}

/// What ended up on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TlsOutcome {
    /// The existing certificate was valid long enough; no issuance attempted.
    Skipped { expires_at: Option<DateTime<Utc>> },
    Issued,
    /// Issuance did not happen or failed; a still-valid certificate was kept.
    KeptExisting {
        reason: FallbackReason,
        retry_at: Option<DateTime<Utc>>,
    },
    SelfSigned {
        reason: FallbackReason,
        retry_at: Option<DateTime<Utc>>,
    },
}

impl TlsOutcome {
    pub fn retry_at(&self) -> Option<DateTime<Utc>> {
        match self {
            TlsOutcome::KeptExisting { retry_at, .. } | TlsOutcome::SelfSigned { retry_at, .. } => {
                *retry_at
            }
            _ => None,
        }
    }
}

/// States of a single issuance attempt.
#[derive(Debug)]
enum Step {
    CheckExisting,
    UpdateDns { domain: String, token: String },
    RequestAcme { domain: String, token: String },
    Install(IssuedCertificate),
    ScheduleRetry(IssuanceFailure),
    SelfSigned {
        reason: FallbackReason,
        retry_at: Option<DateTime<Utc>>,
    },
    Done(TlsOutcome),
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::CheckExisting => "check-existing",
            Step::UpdateDns { .. } => "update-dns",
            Step::RequestAcme { .. } => "request-acme",
            Step::Install(_) => "install",
            Step::ScheduleRetry(_) => "schedule-retry",
            Step::SelfSigned { .. } => "self-signed",
            Step::Done(_) => "done",
        }
    }
}

/// Drives one issuance attempt against the store and external collaborators.
pub struct CertificateIssuer<'a> {
    store: &'a CertificateStore,
    agent: &'a dyn AcmeAgent,
    dns: Option<&'a dyn DnsProvider>,
    scheduler: &'a dyn TaskScheduler,
    policy: IssuancePolicy,
}

impl<'a> CertificateIssuer<'a> {
    pub fn new(
        store: &'a CertificateStore,
        agent: &'a dyn AcmeAgent,
        dns: Option<&'a dyn DnsProvider>,
        scheduler: &'a dyn TaskScheduler,
        policy: IssuancePolicy,
    ) -> Self {
        Self {
            store,
            agent,
            dns,
            scheduler,
            policy,
        }
    }

    pub fn store(&self) -> &CertificateStore {
        self.store
    }

    /// Run the state machine to completion.
    ///
    /// Errors only when no TLS material can be produced at all.
    pub async fn run(
        &self,
        diag: &mut Diagnostics,
        now: DateTime<Utc>,
    ) -> Result<TlsOutcome, CertError> {
        let mut step = Step::CheckExisting;
        loop {
            tracing::debug!("certificate issuance: {}", step.name());
            step = match step {
                Step::Done(outcome) => {
                    tracing::info!(?outcome, "certificate issuance finished");
                    return Ok(outcome);
                }
                Step::CheckExisting => self.check_existing(now).await,
                Step::UpdateDns { domain, token } => self.update_dns(domain, token, diag).await,
                Step::RequestAcme { domain, token } => self.request_acme(domain, token).await,
                Step::Install(issued) => self.install(issued, diag).await,
                Step::ScheduleRetry(failure) => self.schedule_retry(failure, diag, now).await,
                Step::SelfSigned { reason, retry_at } => {
                    self.self_signed(reason, retry_at, now).await?
                }
            };
        }
    }

    async fn check_existing(&self, now: DateTime<Utc>) -> Step {
        let info = self.store.inspect().await;
        let long_enough = !info.is_expiring_within(self.policy.min_remaining, now);

        let (domain, token) = match (&self.policy.domain, &self.policy.dns_token) {
            (Some(d), Some(t)) if !d.is_empty() && !t.is_empty() => (d.clone(), t.clone()),
            _ => {
                if info.is_usable(now) {
                    tracing::info!("no ACME domain/token configured; keeping existing certificate");
                    return Step::Done(TlsOutcome::Skipped {
                        expires_at: info.expires_at(),
                    });
                }
                return Step::SelfSigned {
                    reason: FallbackReason::NotConfigured,
                    retry_at: None,
                };
            }
        };

        // Self-signed material is a stand-in; with ACME configured it is always replaced.
        if info.class == CertificateClass::Acme
            && info.is_usable(now)
            && info.matches_domain(&domain)
            && long_enough
        {
            tracing::info!(
                "certificate for {} valid until {:?}; skipping issuance",
                domain,
                info.expires_at()
            );
            return Step::Done(TlsOutcome::Skipped {
                expires_at: info.expires_at(),
            });
        }
        Step::UpdateDns { domain, token }
    }

    async fn update_dns(&self, domain: String, token: String, diag: &mut Diagnostics) -> Step {
        match self.dns {
            Some(dns) => {
                if let Err(e) = dns.point_at_this_host(&domain).await {
                    diag.warn(Warning::dns_update(format!(
                        "DNS update for {} failed: {}",
                        domain, e
                    )));
                }
            }
            None => tracing::debug!("no DNS provider configured; leaving records alone"),
        }
        Step::RequestAcme { domain, token }
    }

    async fn request_acme(&self, domain: String, token: String) -> Step {
        let request = IssueRequest {
            domain,
            dns_token: token,
            dns_hook: self.policy.dns_hook.clone(),
        };
        match self.agent.issue(&request).await {
            Ok(issued) => Step::Install(issued),
            Err(failure) => Step::ScheduleRetry(failure),
        }
    }

    async fn install(&self, issued: IssuedCertificate, diag: &mut Diagnostics) -> Step {
        match self.store.install(&issued.cert, &issued.key) {
            Ok(()) => {
                if let Err(e) =
                    schedule::remove_marked(self.scheduler, &self.policy.retry_marker).await
                {
                    diag.warn(Warning::issuance(format!(
                        "could not remove scheduled certificate retry: {}",
                        e
                    )));
                }
                Step::Done(TlsOutcome::Issued)
            }
            Err(e) => {
                diag.warn(Warning::issuance(format!(
                    "issued certificate could not be installed: {}",
                    e
                )));
                Step::SelfSigned {
                    reason: FallbackReason::InstallFailed,
                    retry_at: None,
                }
            }
        }
    }

    /// Non-rate-limit failures pass straight through to the fallback.
    async fn schedule_retry(
        &self,
        failure: IssuanceFailure,
        diag: &mut Diagnostics,
        now: DateTime<Utc>,
    ) -> Step {
        // Whatever happens below, an entry from an earlier attempt has served its purpose.
        if let Err(e) = schedule::remove_marked(self.scheduler, &self.policy.retry_marker).await {
            diag.warn(Warning::issuance(format!(
                "could not remove stale certificate retry: {}",
                e
            )));
        }

        let retry_text = match &failure.kind {
            FailureKind::RateLimited { retry_after } => retry_after.clone(),
            _ => {
                diag.warn(Warning::issuance(format!(
                    "certificate issuance failed: {}",
                    failure
                )));
                return Step::SelfSigned {
                    reason: FallbackReason::IssuanceFailed,
                    retry_at: None,
                };
            }
        };

        let text = retry_text.unwrap_or_else(|| failure.detail.clone());
        let window = RateLimitWindow::from_response(&text, now);
        let retry_at = match window {
            Some(window) => {
                let at = window.retry_not_before;
                match schedule::schedule_once(
                    self.scheduler,
                    &self.policy.retry_marker,
                    &at,
                    &self.policy.retry_command,
                )
                .await
                {
                    Ok(()) => {
                        diag.warn(Warning::rate_limited(format!(
                            "issuer rate limit hit; retry scheduled for {}",
                            at
                        )));
                        Some(at)
                    }
                    Err(e) => {
                        diag.warn(Warning::rate_limited(format!(
                            "issuer rate limit hit until {}; scheduling the retry failed: {}",
                            at, e
                        )));
                        None
                    }
                }
            }
            None => {
                let reason = match parse_retry_after(&text) {
                    Some(past) => format!("retry time {} already passed", past),
                    None => "no retry time found".to_string(),
                };
                diag.warn(Warning::rate_limited(format!(
                    "issuer rate limit hit ({}); no automatic retry, run `cert renew` later",
                    reason
                )));
                None
            }
        };

        Step::SelfSigned {
            reason: FallbackReason::RateLimited,
            retry_at,
        }
    }

    async fn self_signed(
        &self,
        reason: FallbackReason,
        retry_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Step, CertError> {
        // A still-valid certificate for the configured domain beats a fresh self-signed one.
        let info = self.store.inspect().await;
        let covers_domain = self
            .policy
            .domain
            .as_deref()
            .is_some_and(|d| info.matches_domain(d));
        if reason != FallbackReason::NotConfigured && info.is_usable(now) && covers_domain {
            tracing::warn!(
                "keeping existing certificate (expires {:?}) after failed issuance",
                info.expires_at()
            );
            return Ok(Step::Done(TlsOutcome::KeptExisting { reason, retry_at }));
        }

        let name = self
            .policy
            .domain
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.policy.fallback_name.clone());

        match self
            .store
            .generate_self_signed(&name, self.policy.self_signed_days)
            .await
        {
            Ok(()) => Ok(Step::Done(TlsOutcome::SelfSigned { reason, retry_at })),
            Err(e) => {
                tracing::error!("no TLS material could be produced: {}", e);
                Err(match e {
                    CertError::SelfSignedGeneration(_) => e,
                    other => CertError::SelfSignedGeneration(other.to_string()),
                })
            }
        }
    }
}
