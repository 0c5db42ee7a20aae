//! External command execution for the procgate gateway.
//!
//! Everything the gateway runs outside the process-manager RPC surface
//! (git pulls, log tails, the pm2 CLI itself) goes through the single
//! [`CommandExecutor`] trait so tests can substitute a scripted
//! implementation and never spawn real subprocesses.

pub mod mock;

use async_trait::async_trait;
use procgate_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Default bound on any single external command (30 seconds).
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured result of one external command invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Converts a non-zero exit into a Transport error carrying the
    /// captured stderr, which is usually the interesting text.
    pub fn require_success(self, what: &str) -> Result<CommandOutput> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::transport_with_stderr(
                format!("{} exited with status {}", what, self.exit_code),
                self.stderr,
            ))
        }
    }
}

/// An invocation request: program, arguments, optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: None,
        }
    }

    pub fn with_args(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: None,
        }
    }

    pub fn in_dir(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }
}

/// Narrow collaborator interface for running external commands.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs the command to completion, capturing stdout, stderr, and the
    /// exit status. Spawn failures and timeouts are Transport errors; a
    /// non-zero exit is NOT an error at this layer (callers decide).
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Production executor over `tokio::process::Command`.
///
/// Every invocation is bounded by a timeout so an unresponsive subprocess
/// (a hung network remote during `git pull`, for example) cannot hold a
/// request open indefinitely. Stdin is closed so nothing can prompt.
pub struct SystemExecutor {
    timeout: Duration,
}

impl SystemExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!("Executing: {} {}", spec.program, spec.args.join(" "));

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref cwd) = spec.cwd {
            cmd.current_dir(cwd);
        }

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                Error::transport(format!(
                    "Command '{}' timed out after {:?}",
                    spec.program, self.timeout
                ))
            })?
            .map_err(|e| {
                Error::transport(format!("Failed to spawn '{}': {}", spec.program, e))
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let executor = SystemExecutor::default();
        let spec = CommandSpec::new("echo", &["hello"]);
        let output = executor.execute(&spec).await.unwrap();
        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn spawn_failure_is_a_transport_error() {
        let executor = SystemExecutor::default();
        let spec = CommandSpec::new("procgate-no-such-binary", &[]);
        let err = executor.execute(&spec).await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[test]
    fn require_success_surfaces_stderr() {
        let output = CommandOutput {
            stdout: String::new(),
            stderr: "fatal: not a git repository\n".to_string(),
            exit_code: 128,
        };
        let err = output.require_success("git pull").unwrap_err();
        assert_eq!(err.display_detail(), "fatal: not a git repository");
    }
}
