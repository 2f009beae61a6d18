// ABOUTME: Certificate status and renew commands.
// ABOUTME: Renew is also what the scheduled retry entry runs.

use super::{Host, emit_warnings};
use chrono::Utc;
use hubstack::cert::{CertificateIssuer, TlsOutcome, certificate_status};
use hubstack::diagnostics::Diagnostics;
use hubstack::dns::DnsProvider;
use hubstack::error::Result;
use hubstack::output::Output;

pub async fn cert_status(host: &Host, output: Output) -> Result<()> {
    let config = &host.config;
    let domain = host.domain();
    let status = certificate_status(
        &host.certs,
        domain.as_deref(),
        config.tls.renewal_margin,
        &config.cert_log_path(),
        Utc::now(),
    )
    .await;
    output.report("cert status", &status, &status.to_string());
    Ok(())
}

pub async fn cert_renew(host: &Host, mut output: Output) -> Result<()> {
    output.start_timer();
    let agent = host.acme_agent();
    let dns = host.dns()?;
    let dns = dns.as_ref().map(|d| d as &dyn DnsProvider);
    let issuer = CertificateIssuer::new(
        &host.certs,
        &agent,
        dns,
        &host.scheduler,
        host.issuance_policy(),
    );

    let mut diag = Diagnostics::default();
    let outcome = issuer.run(&mut diag, Utc::now()).await?;
    emit_warnings(&output, &diag);

    let message = match &outcome {
        TlsOutcome::Skipped { .. } => "Certificate still valid, nothing to do".to_string(),
        TlsOutcome::Issued => "Certificate issued".to_string(),
        TlsOutcome::KeptExisting { .. } => "Issuance failed, existing certificate kept".to_string(),
        TlsOutcome::SelfSigned { .. } => "Issuance failed, self-signed certificate installed".to_string(),
    };
    let message = match outcome.retry_at() {
        Some(at) => format!("{message}; retry at {}", at.format("%Y-%m-%d %H:%M UTC")),
        None => message,
    };
    output.report("cert renew", &outcome, &message);
    output.success("Certificate check complete");
    Ok(())
}
