//! pm2 backend for the manager boundary.
//!
//! Drives the pm2 CLI through the [`CommandExecutor`] collaborator, so the
//! whole backend can be exercised in tests without a pm2 daemon. `jlist`
//! output is the source of truth for process state.

use crate::client::{ManagerClient, ManagerSession};
use async_trait::async_trait;
use procgate_common::{
    Error, ExecutionMode, ManagedProcess, ProcessStatus, Result, StartRequest,
};
use procgate_exec::{CommandExecutor, CommandSpec};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Manager client backed by the pm2 CLI.
pub struct Pm2Client {
    bin: String,
    executor: Arc<dyn CommandExecutor>,
}

impl Pm2Client {
    pub fn new(bin: impl Into<String>, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            bin: bin.into(),
            executor,
        }
    }
}

#[async_trait]
impl ManagerClient for Pm2Client {
    async fn connect(&self) -> Result<Arc<dyn ManagerSession>> {
        // `pm2 ping` starts the daemon if needed and verifies it answers.
        let spec = CommandSpec::new(&self.bin, &["ping"]);
        self.executor
            .execute(&spec)
            .await?
            .require_success("pm2 ping")?;

        Ok(Arc::new(Pm2Session {
            bin: self.bin.clone(),
            executor: Arc::clone(&self.executor),
        }))
    }
}

struct Pm2Session {
    bin: String,
    executor: Arc<dyn CommandExecutor>,
}

/// One entry of `pm2 jlist` output, reduced to the fields we read.
#[derive(Debug, Deserialize)]
struct Pm2Process {
    pm_id: u64,
    name: String,
    #[serde(default)]
    pid: Option<u32>,
    pm2_env: Pm2Env,
}

#[derive(Debug, Deserialize)]
struct Pm2Env {
    #[serde(default)]
    status: Option<ProcessStatus>,
    #[serde(default)]
    pm_cwd: Option<PathBuf>,
    #[serde(default)]
    pm_uptime: Option<i64>,
    #[serde(default)]
    restart_time: Option<u32>,
}

impl From<Pm2Process> for ManagedProcess {
    fn from(raw: Pm2Process) -> Self {
        ManagedProcess {
            id: raw.pm_id,
            name: raw.name,
            // pm2 reports pid 0 for processes that are not running.
            pid: raw.pid.filter(|pid| *pid != 0),
            status: raw
                .pm2_env
                .status
                .unwrap_or_else(|| ProcessStatus::Other("unknown".to_string())),
            working_directory: raw.pm2_env.pm_cwd,
            uptime_start_millis: raw.pm2_env.pm_uptime,
            restart_count: raw.pm2_env.restart_time.unwrap_or(0),
        }
    }
}

impl Pm2Session {
    fn matches(process: &ManagedProcess, token: &str) -> bool {
        process.id.to_string() == token || process.name == token
    }

    fn launch_args(request: &StartRequest, script: &str) -> Vec<String> {
        let mut args = vec![
            "start".to_string(),
            script.to_string(),
            "--name".to_string(),
            request.name.clone(),
        ];
        if let Some(ref cwd) = request.cwd {
            args.push("--cwd".to_string());
            args.push(cwd.clone());
        }
        // `-i` alone switches pm2 into cluster mode, so fork launches with
        // multiple instances must also carry the fork-mode flag.
        match request.exec_mode {
            ExecutionMode::Cluster => {
                args.push("-i".to_string());
                args.push(request.instances.to_string());
            }
            ExecutionMode::Fork if request.instances > 1 => {
                args.push("-x".to_string());
                args.push("-i".to_string());
                args.push(request.instances.to_string());
            }
            ExecutionMode::Fork => {}
        }
        if let Some(ref raw) = request.args {
            args.push("--".to_string());
            args.extend(raw.split_whitespace().map(str::to_string));
        }
        args
    }
}

#[async_trait]
impl ManagerSession for Pm2Session {
    async fn list(&self) -> Result<Vec<ManagedProcess>> {
        let spec = CommandSpec::new(&self.bin, &["jlist"]);
        let output = self
            .executor
            .execute(&spec)
            .await?
            .require_success("pm2 jlist")?;

        let raw: Vec<Pm2Process> = serde_json::from_str(output.stdout.trim()).map_err(|e| {
            Error::transport(format!("Failed to parse pm2 jlist output: {}", e))
        })?;

        Ok(raw.into_iter().map(ManagedProcess::from).collect())
    }

    async fn describe(&self, token: &str) -> Result<Vec<ManagedProcess>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|p| Self::matches(p, token))
            .collect())
    }

    async fn start(&self, request: &StartRequest) -> Result<ManagedProcess> {
        let args = match request.script {
            // Saved definition: `pm2 start <name>`.
            None => vec!["start".to_string(), request.name.clone()],
            Some(ref script) => Self::launch_args(request, script),
        };

        let spec = CommandSpec::with_args(&self.bin, args);
        self.executor
            .execute(&spec)
            .await?
            .require_success("pm2 start")?;

        self.describe(&request.name)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::transport(format!(
                    "Process '{}' started but is not visible in the manager list",
                    request.name
                ))
            })
    }

    async fn stop(&self, token: &str) -> Result<()> {
        let spec = CommandSpec::new(&self.bin, &["stop", token]);
        self.executor
            .execute(&spec)
            .await?
            .require_success("pm2 stop")?;
        Ok(())
    }

    async fn restart(&self, token: &str) -> Result<()> {
        let spec = CommandSpec::new(&self.bin, &["restart", token]);
        self.executor
            .execute(&spec)
            .await?
            .require_success("pm2 restart")?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        // The CLI holds no persistent daemon connection to tear down.
        debug!("Released pm2 session");
        Ok(())
    }
}
