// ABOUTME: Slot status command.
// ABOUTME: Shows the active slot and which prefixed containers each slot has.

use super::Host;
use hubstack::error::Result;
use hubstack::output::{Output, OutputMode};
use hubstack::runtime::{ContainerFilters, ContainerOps};
use hubstack::types::Slot;
use serde::Serialize;

#[derive(Serialize)]
struct SlotStatus {
    active: Slot,
    slot_file: String,
    persisted: bool,
    containers: Vec<String>,
    inactive_containers: Vec<String>,
}

pub async fn slot_status(host: &Host, output: Output) -> Result<()> {
    let slots = host.slots()?;
    let prefix = &host.config.app.container_prefix;
    let store_path = host.config.slot_file();

    let mut containers = Vec::new();
    let mut inactive_containers = Vec::new();
    match host.engine(&Output::new(OutputMode::Quiet)).await {
        Ok(runtime) => {
            for (slot, names) in [
                (slots.active(), &mut containers),
                (slots.inactive(), &mut inactive_containers),
            ] {
                let slot_prefix = slot.container_prefix(prefix);
                match runtime
                    .list_containers(&ContainerFilters::name_contains(slot_prefix.clone()))
                    .await
                {
                    Ok(listed) => names.extend(
                        listed
                            .into_iter()
                            .map(|c| c.name.into_inner())
                            .filter(|n| n.starts_with(&slot_prefix)),
                    ),
                    Err(e) => output.warning(&format!("cannot list slot {slot} containers: {e}")),
                }
            }
        }
        Err(e) => output.warning(&format!("container engine unavailable: {e}")),
    }

    let status = SlotStatus {
        active: slots.active(),
        slot_file: store_path.display().to_string(),
        persisted: store_path.exists(),
        containers,
        inactive_containers,
    };
    let text = format!(
        "Active slot: {}{}\n  Running: {}\n  Slot {} leftovers: {}",
        status.active,
        if status.persisted { "" } else { " (default)" },
        list_or_none(&status.containers),
        slots.inactive(),
        list_or_none(&status.inactive_containers)
    );
    output.report("slot status", &status, &text);
    Ok(())
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
