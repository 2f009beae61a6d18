// ABOUTME: Crontab-backed task scheduler.
// ABOUTME: Reads with `crontab -l` and replaces with `crontab -`.

use super::{ScheduleError, TaskScheduler};
use crate::process::HostCommand;
use async_trait::async_trait;

/// The invoking user's crontab.
#[derive(Debug, Clone)]
pub struct Crontab {
    program: String,
}

impl Default for Crontab {
    fn default() -> Self {
        Self {
            program: "crontab".to_string(),
        }
    }
}

impl Crontab {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskScheduler for Crontab {
    async fn read_table(&self) -> Result<String, ScheduleError> {
        let cmd = HostCommand::new(&self.program).arg("-l");
        let out = cmd.run().await.map_err(|source| ScheduleError::Spawn {
            command: cmd.display(),
            source,
        })?;

        if out.success {
            return Ok(out.stdout);
        }
        // A user without a crontab gets exit 1 and "no crontab for <user>".
        if out.stderr.contains("no crontab") {
            return Ok(String::new());
        }
        Err(ScheduleError::Failed {
            command: cmd.display(),
            message: out.summary(),
        })
    }

    async fn write_table(&self, table: &str) -> Result<(), ScheduleError> {
        let cmd = HostCommand::new(&self.program).arg("-").stdin(table);
        let out = cmd.run().await.map_err(|source| ScheduleError::Spawn {
            command: cmd.display(),
            source,
        })?;

        if out.success {
            Ok(())
        } else {
            Err(ScheduleError::Failed {
                command: cmd.display(),
                message: out.summary(),
            })
        }
    }
}
