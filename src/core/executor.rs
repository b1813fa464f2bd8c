//! Checker process execution.
//!
//! This module invokes external checker binaries with an explicit argument
//! list, capturing their full output before any pass/fail decision is made.

use crate::core::error::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

/// Output from a checker invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Whether the command was killed due to timeout.
    pub timed_out: bool,
    /// Duration the command took to run.
    pub duration: Duration,
}

impl CommandOutput {
    /// Returns true if the command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }

    /// Returns combined stdout and stderr output.
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Options for checker execution.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Working directory for the command.
    pub cwd: Option<std::path::PathBuf>,
    /// Timeout for the command. None means wait for completion; the gate
    /// blocks on each checker by default.
    pub timeout: Option<Duration>,
}

impl ExecuteOptions {
    /// Sets the working directory.
    #[must_use]
    pub fn cwd(mut self, path: impl AsRef<Path>) -> Self {
        self.cwd = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// Executor for running checker commands.
#[derive(Debug, Default)]
pub struct Executor;

impl Executor {
    /// Creates a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Executes a checker with the given arguments.
    pub async fn execute(
        &self,
        program: &str,
        args: &[String],
        options: ExecuteOptions,
    ) -> Result<CommandOutput> {
        let start = std::time::Instant::now();

        let mut cmd = Command::new(program);
        cmd.args(args);

        if let Some(ref cwd) = options.cwd {
            cmd.current_dir(cwd);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| Error::io("spawn checker", e))?;

        let result = if let Some(timeout_duration) = options.timeout {
            match timeout(timeout_duration, self.wait_for_output(&mut child)).await {
                Ok(result) => result,
                Err(_) => {
                    // Kill the process on timeout - ignore result since we're returning anyway
                    drop(child.kill().await);
                    return Ok(CommandOutput {
                        exit_code: 124,
                        stdout: String::new(),
                        stderr: "Checker timed out".to_string(),
                        timed_out: true,
                        duration: start.elapsed(),
                    });
                },
            }
        } else {
            self.wait_for_output(&mut child).await
        };

        let (exit_code, stdout, stderr) = result?;

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
            timed_out: false,
            duration: start.elapsed(),
        })
    }

    /// Waits for the command to complete and captures output.
    async fn wait_for_output(
        &self,
        child: &mut tokio::process::Child,
    ) -> Result<(i32, String, String)> {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let stdout_handle = tokio::spawn(async move {
            let mut output = String::new();
            if let Some(stdout) = stdout {
                let mut reader = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    output.push_str(&line);
                    output.push('\n');
                }
            }
            output
        });

        let stderr_handle = tokio::spawn(async move {
            let mut output = String::new();
            if let Some(stderr) = stderr {
                let mut reader = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    output.push_str(&line);
                    output.push('\n');
                }
            }
            output
        });

        let status = child
            .wait()
            .await
            .map_err(|e| Error::io("wait for checker", e))?;

        let stdout = stdout_handle.await.map_err(|e| Error::Internal {
            message: format!("stdout task failed: {e}"),
        })?;
        let stderr = stderr_handle.await.map_err(|e| Error::Internal {
            message: format!("stderr task failed: {e}"),
        })?;

        Ok((status.code().unwrap_or(1), stdout, stderr))
    }

    /// Checks if a command exists in PATH.
    #[must_use]
    pub fn command_exists(command: &str) -> bool {
        which::which(command).is_ok()
    }
}
