// ABOUTME: Clean and revert command implementations.
// ABOUTME: Both run the cleanup orchestrator against the local engine.

use super::{Host, emit_warnings};
use chrono::Utc;
use hubstack::cleanup::CleanupOrchestrator;
use hubstack::diagnostics::Diagnostics;
use hubstack::error::Result;
use hubstack::output::Output;
use hubstack::types::ServiceName;

/// Remove the containers and networks of `services` (all when empty).
pub async fn clean(
    host: &Host,
    services: Vec<ServiceName>,
    wipe_data: bool,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let config = &host.config;
    let targets = if services.is_empty() {
        config.services.iter().cloned().collect()
    } else {
        services
    };
    output.progress(&format!(
        "Cleaning {}{}",
        targets
            .iter()
            .map(ServiceName::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        if wipe_data { " and wiping data" } else { "" }
    ));

    let runtime = host.engine(&output).await?;
    let plan = config.cleanup_plan(host.domain());
    let cleanup = CleanupOrchestrator::new(
        &runtime,
        &host.certs,
        &host.scheduler,
        &host.firewall,
        host.prompter.as_ref(),
        &plan,
    );
    let mut diag = Diagnostics::default();
    let report = cleanup
        .clean_selected(&targets, wipe_data, &mut diag, Utc::now())
        .await?;

    emit_warnings(&output, &diag);
    output.report("clean", &report, &format!("Cleanup:\n{report}"));
    output.success(&format!("Removed {} resource(s)", report.done_count()));
    Ok(())
}

/// Undo the whole deployment; the certificate survives when it is worth keeping.
pub async fn revert(host: &Host, mut output: Output) -> Result<()> {
    output.start_timer();
    let config = &host.config;
    output.progress(&format!("Reverting {}", config.app.name));

    let runtime = host.engine(&output).await?;
    let plan = config.cleanup_plan(host.domain());
    let cleanup = CleanupOrchestrator::new(
        &runtime,
        &host.certs,
        &host.scheduler,
        &host.firewall,
        host.prompter.as_ref(),
        &plan,
    );
    let mut diag = Diagnostics::default();
    let report = cleanup.revert(&mut diag, Utc::now()).await?;

    emit_warnings(&output, &diag);
    output.report("revert", &report, &format!("Revert:\n{report}"));
    if report.failure_count() > 0 {
        output.success(&format!(
            "Reverted with {} failure(s); re-run to retry",
            report.failure_count()
        ));
    } else {
        output.success("Reverted");
    }
    Ok(())
}
