// ABOUTME: Certificate-risk assessment before deleting the certificate directory.
// ABOUTME: Live ACME certificates are preserved across destructive steps by default.

use super::classify::CertificateClass;
use super::error::CertError;
use super::store::{BackupHandle, CertificateInfo, CertificateStore};
use crate::prompt::{PromptError, Prompter};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Preservation {
    Preserve,
    Discard,
}

/// What deleting the certificate would cost.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateRisk {
    pub info: CertificateInfo,
    /// Domain the deployment was configured for, if known.
    pub domain: Option<String>,
    pub domain_matches: Option<bool>,
    /// ACME-issued and not yet expired: reissuing may hit the rate limit.
    pub live_acme: bool,
}

/// Inspect the certificate and weigh the cost of losing it.
pub async fn assess(
    store: &CertificateStore,
    domain: Option<&str>,
    now: DateTime<Utc>,
) -> CertificateRisk {
    let info = store.inspect().await;
    let live_acme = info.class == CertificateClass::Acme && !info.is_expired(now);
    let domain_matches = domain.map(|d| info.matches_domain(d));
    CertificateRisk {
        info,
        domain: domain.map(str::to_string),
        domain_matches,
        live_acme,
    }
}

impl CertificateRisk {
    /// What auto-confirm does: keep live ACME material, drop everything else.
    pub fn default_decision(&self) -> Preservation {
        if self.live_acme {
            Preservation::Preserve
        } else {
            Preservation::Discard
        }
    }

    pub fn describe(&self) -> String {
        let Some(fields) = &self.info.fields else {
            return format!("{} ({:?})", self.info.path.display(), self.info.class);
        };
        let domain = match (&self.domain, self.domain_matches) {
            (Some(d), Some(true)) => format!(", matches {d}"),
            (Some(d), _) => format!(", does NOT match {d}"),
            (None, _) => String::new(),
        };
        format!(
            "subject [{}], issuer [{}], expires {}{}",
            fields.subject,
            fields.issuer,
            fields.not_after.format("%Y-%m-%d %H:%M UTC"),
            domain
        )
    }

    /// Ask the operator (or take the default). Answering yes deletes the certificate.
    pub fn decide(&self, prompter: &dyn Prompter) -> Result<Preservation, PromptError> {
        if self.info.class == CertificateClass::Missing {
            return Ok(Preservation::Discard);
        }

        let mut question = format!("Certificate {}.", self.describe());
        if self.live_acme {
            question.push_str(" Reissuing may be rate limited for days.");
        }
        question.push_str(" Delete it?");

        let delete_by_default = self.default_decision() == Preservation::Discard;
        let delete = prompter.confirm(&question, delete_by_default)?;
        let decision = if delete {
            Preservation::Discard
        } else {
            Preservation::Preserve
        };
        tracing::info!(?decision, class = ?self.info.class, "certificate risk decision");
        Ok(decision)
    }
}

/// A certificate held in the backup slot across a destructive step.
///
/// Call [`PreservedCertificate::restore`] as the very last step, after the
/// deleted directory has been recreated.
#[must_use = "a preserved certificate must be restored"]
pub struct PreservedCertificate<'a> {
    store: &'a CertificateStore,
    handle: Option<BackupHandle>,
}

impl<'a> PreservedCertificate<'a> {
    /// Back up the pair when preserving. A failed backup is an error: the
    /// caller must then not delete the directory.
    pub fn begin(store: &'a CertificateStore, decision: Preservation) -> Result<Self, CertError> {
        let handle = match decision {
            Preservation::Preserve => Some(store.backup()?),
            Preservation::Discard => None,
        };
        Ok(Self { store, handle })
    }

    pub fn is_holding(&self) -> bool {
        self.handle.is_some()
    }

    /// Put the certificate back. True when nothing was held or the restore worked.
    pub fn restore(self) -> bool {
        match self.handle {
            Some(handle) => self.store.restore(handle),
            None => true,
        }
    }
}
