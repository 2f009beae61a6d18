// ABOUTME: Runs host commands (crontab, iptables, openssl, compose) and captures their output.
// ABOUTME: Shared by every adapter that shells out to a host tool.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Result of running a host command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// stdout followed by stderr, the way a terminal would show them.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }

    /// First non-empty stderr line, falling back to stdout.
    pub fn summary(&self) -> String {
        self.stderr
            .lines()
            .chain(self.stdout.lines())
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("no output")
            .to_string()
    }
}

/// A command to run, with optional stdin and extra environment.
#[derive(Debug, Clone, Default)]
pub struct HostCommand {
    program: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    stdin: Option<String>,
}

impl HostCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn arg_path(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    /// Printable form for logs. Environment values are never printed.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion. Spawn failures (missing binary) are the only error.
    pub async fn run(&self) -> std::io::Result<CommandOutput> {
        tracing::debug!("running {}", self.display());

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .envs(&self.env)
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(ref input) = self.stdin
            && let Some(mut pipe) = child.stdin.take()
        {
            pipe.write_all(input.as_bytes()).await?;
            // Close stdin so the child sees EOF.
            drop(pipe);
        }

        let output = child.wait_with_output().await?;
        let result = CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !result.success {
            tracing::debug!(
                "{} exited with {:?}: {}",
                self.program,
                result.exit_code,
                result.summary()
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_program_and_args() {
        let cmd = HostCommand::new("iptables")
            .args(["-t", "nat", "-C", "PREROUTING"])
            .env("SECRET", "hidden");
        assert_eq!(cmd.display(), "iptables -t nat -C PREROUTING");
    }

    #[test]
    fn summary_prefers_stderr() {
        let out = CommandOutput {
            success: false,
            exit_code: Some(1),
            stdout: "partial\n".to_string(),
            stderr: "\nno crontab for root\n".to_string(),
        };
        assert_eq!(out.summary(), "no crontab for root");
        assert_eq!(out.combined(), "partial\n\nno crontab for root\n");
    }

    #[tokio::test]
    async fn run_feeds_stdin_and_captures_stdout() {
        let out = HostCommand::new("cat").stdin("hello").run().await.unwrap();
        assert!(out.success);
        assert_eq!(out.stdout, "hello");
    }

    #[tokio::test]
    async fn run_reports_missing_binary_as_io_error() {
        let result = HostCommand::new("definitely-not-a-real-binary-xyz").run().await;
        assert!(result.is_err());
    }
}
