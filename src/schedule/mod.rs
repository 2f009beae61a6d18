// ABOUTME: Scheduled-task surface owned by this deployment.
// ABOUTME: Entries carry a marker; only marked entries are ever added or removed.

mod crontab;

pub use crontab::Crontab;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Local, TimeDelta, TimeZone, Timelike};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed: {message}")]
    Failed { command: String, message: String },
}

/// Read and replace the host's task table.
#[async_trait]
pub trait TaskScheduler: Send + Sync {
    /// Current table as text. An absent table reads as empty.
    async fn read_table(&self) -> Result<String, ScheduleError>;

    /// Replace the whole table.
    async fn write_table(&self, table: &str) -> Result<(), ScheduleError>;
}

/// Render a cron line that fires once at `at` (local time) and carries `marker`.
///
/// Cron has minute resolution, so a time with seconds rounds up to the next minute
/// and the entry never fires before `at`. Cron has no year field either; the
/// next issuance attempt clears the entry, whether it succeeds or fails.
pub fn render_one_shot<Tz: TimeZone>(at: &DateTime<Tz>, command: &str, marker: &str) -> String {
    let fire = round_up_to_minute(at.with_timezone(&Local));
    format!(
        "{} {} {} {} * {} # {}",
        fire.minute(),
        fire.hour(),
        fire.day(),
        fire.month(),
        command,
        marker
    )
}

fn round_up_to_minute(at: DateTime<Local>) -> DateTime<Local> {
    let floor = at
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at);
    if floor < at {
        floor + TimeDelta::minutes(1)
    } else {
        floor
    }
}

/// Drop every line containing `marker`. Returns the new table and how many lines went.
pub fn strip_marked(table: &str, marker: &str) -> (String, usize) {
    let mut removed = 0;
    let kept: Vec<&str> = table
        .lines()
        .filter(|line| {
            let owned = line.contains(marker);
            if owned {
                removed += 1;
            }
            !owned
        })
        .collect();

    let mut out = kept.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    (out, removed)
}

/// Replace any entry carrying `marker` with a one-shot entry at `at`.
pub async fn schedule_once<Tz: TimeZone>(
    scheduler: &dyn TaskScheduler,
    marker: &str,
    at: &DateTime<Tz>,
    command: &str,
) -> Result<(), ScheduleError> {
    let table = scheduler.read_table().await?;
    let (mut table, _) = strip_marked(&table, marker);
    table.push_str(&render_one_shot(at, command, marker));
    table.push('\n');
    scheduler.write_table(&table).await?;
    tracing::info!("scheduled '{}' for {}", command, at.with_timezone(&Local));
    Ok(())
}

/// Remove every entry carrying `marker`; untouched when nothing matches.
pub async fn remove_marked(
    scheduler: &dyn TaskScheduler,
    marker: &str,
) -> Result<usize, ScheduleError> {
    let table = scheduler.read_table().await?;
    let (stripped, removed) = strip_marked(&table, marker);
    if removed > 0 {
        scheduler.write_table(&stripped).await?;
        tracing::info!("removed {} scheduled task(s) marked '{}'", removed, marker);
    }
    Ok(removed)
}
