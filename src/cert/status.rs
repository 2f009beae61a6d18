// ABOUTME: Certificate status report for operators.
// ABOUTME: Combines on-disk inspection with the last issuance attempt's log.

use super::acme::{FailureKind, classify_log};
use super::classify::CertificateClass;
use super::rate_limit::parse_retry_after;
use super::store::CertificateStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct CertificateStatus {
    pub path: String,
    pub class: CertificateClass,
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
    pub key_present: bool,
    pub usable: bool,
    pub domain: Option<String>,
    pub domain_matches: Option<bool>,
    pub renewal_due: bool,
    pub last_failure: Option<FailureKind>,
    pub retry_not_before: Option<DateTime<Utc>>,
}

/// Build the report. A missing or unreadable log means no known failure.
pub async fn certificate_status(
    store: &CertificateStore,
    domain: Option<&str>,
    renewal_margin: Duration,
    log_path: &Path,
    now: DateTime<Utc>,
) -> CertificateStatus {
    let info = store.inspect().await;
    let last_failure = std::fs::read_to_string(log_path)
        .ok()
        .and_then(|log| classify_log(&log));
    let retry_not_before = match &last_failure {
        Some(FailureKind::RateLimited {
            retry_after: Some(text),
        }) => parse_retry_after(text).filter(|at| *at > now),
        _ => None,
    };

    CertificateStatus {
        path: info.path.display().to_string(),
        class: info.class,
        subject: info.fields.as_ref().map(|f| f.subject.clone()),
        issuer: info.fields.as_ref().map(|f| f.issuer.clone()),
        expires_at: info.expires_at(),
        days_remaining: info.remaining(now).map(|d| d.num_days()),
        key_present: info.key_present,
        usable: info.is_usable(now),
        domain: domain.map(str::to_string),
        domain_matches: domain.map(|d| info.matches_domain(d)),
        renewal_due: info.is_expiring_within(renewal_margin, now),
        last_failure,
        retry_not_before,
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Certificate: {}", self.path)?;
        writeln!(f, "  Type:     {:?}", self.class)?;
        if let Some(ref subject) = self.subject {
            writeln!(f, "  Subject:  {subject}")?;
        }
        if let Some(ref issuer) = self.issuer {
            writeln!(f, "  Issuer:   {issuer}")?;
        }
        if let (Some(at), Some(days)) = (self.expires_at, self.days_remaining) {
            writeln!(f, "  Expires:  {} ({} days)", at.format("%Y-%m-%d %H:%M UTC"), days)?;
        }
        if let (Some(domain), Some(matches)) = (&self.domain, self.domain_matches) {
            writeln!(
                f,
                "  Domain:   {} ({})",
                domain,
                if matches { "matches" } else { "does not match" }
            )?;
        }
        writeln!(f, "  Key:      {}", if self.key_present { "present" } else { "missing" })?;
        if self.renewal_due {
            writeln!(f, "  Renewal:  due")?;
        }
        if let Some(ref failure) = self.last_failure {
            writeln!(f, "  Last run: {failure}")?;
        }
        if let Some(at) = self.retry_not_before {
            writeln!(f, "  Retry:    not before {}", at.format("%Y-%m-%d %H:%M UTC"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::store::testing::store_in;
    use crate::cert::x509::fake::{FakeX509, acme_fields, write_pair};
    use chrono::Duration as Days;
    use std::sync::Arc;

    #[tokio::test]
    async fn reports_rate_limit_from_last_run_log() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path(), Arc::new(FakeX509::default()));
        let now = Utc::now();
        write_pair(store.cert_path(), store.key_path(), &acme_fields("example.org", now + Days::days(20)));
        let log = tmp.path().join("last_run.log");
        let retry = (now + Days::days(2)).format("%Y-%m-%dT%H:%M:%SZ");
        std::fs::write(&log, format!("too many certificates already issued, retry after {retry}\n")).unwrap();

        let status = certificate_status(&store, Some("example.org"), Duration::from_secs(30 * 86400), &log, now).await;

        assert_eq!(status.class, CertificateClass::Acme);
        assert_eq!(status.domain_matches, Some(true));
        assert!(status.renewal_due);
        assert!(matches!(status.last_failure, Some(FailureKind::RateLimited { .. })));
        assert!(status.retry_not_before.is_some());
        assert!(status.to_string().contains("Retry:    not before"));
    }

    #[tokio::test]
    async fn missing_everything_reports_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path(), Arc::new(FakeX509::default()));
        let status = certificate_status(
            &store,
            None,
            Duration::from_secs(86400),
            &tmp.path().join("nope.log"),
            Utc::now(),
        )
        .await;

        assert_eq!(status.class, CertificateClass::Missing);
        assert!(!status.usable);
        assert!(status.last_failure.is_none());
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["class"], "missing");
    }
}
