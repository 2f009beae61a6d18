// ABOUTME: Deploy command implementation.
// ABOUTME: Builds the orchestrator from host adapters and reports the run.

use super::{Host, emit_warnings};
use chrono::Utc;
use hubstack::cert::CertificateIssuer;
use hubstack::cleanup::CleanupOrchestrator;
use hubstack::deploy::{DeployOptions, DeploySettings, DeploymentOrchestrator};
use hubstack::diagnostics::Diagnostics;
use hubstack::dns::DnsProvider;
use hubstack::error::Result;
use hubstack::manifest::ComposeCli;
use hubstack::output::Output;

pub async fn deploy(host: &Host, options: DeployOptions, mut output: Output) -> Result<()> {
    output.start_timer();
    let config = &host.config;
    let mut diag = Diagnostics::default();

    output.progress(&format!(
        "Deploying {} ({} service(s)){}",
        config.app.name,
        if options.services.is_empty() {
            config.services.len()
        } else {
            options.services.len()
        },
        if options.swap { " with slot swap" } else { "" }
    ));

    let runtime = host.engine(&output).await?;
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
    let plan = config.cleanup_plan(host.domain());
    let cleanup = CleanupOrchestrator::new(
        &runtime,
        &host.certs,
        &host.scheduler,
        &host.firewall,
        host.prompter.as_ref(),
        &plan,
    );
    let applier = ComposeCli::new(
        config.manifest.engine_cli.clone(),
        config.app.container_prefix.clone(),
    );
    let orchestrator = DeploymentOrchestrator::new(
        &runtime,
        &issuer,
        &cleanup,
        &applier,
        DeploySettings::from_config(config),
    );

    let mut slots = host.slots()?;
    output.progress(&format!("  → Active slot: {}", slots.active()));
    let report = orchestrator
        .run(&mut slots, &options, &mut diag, Utc::now())
        .await?;

    emit_warnings(&output, &diag);
    output.report("deploy", &report, &report.to_string());
    output.success(&format!("Deployed {} to slot {}", config.app.name, report.slot));
    Ok(())
}
