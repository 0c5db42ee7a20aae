//! Core domain types for the procgate gateway.
//!
//! `ManagedProcess` mirrors what the external process manager reports; this
//! side only observes it and requests transitions, it never owns or mutates
//! process state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Process state as reported by the external manager.
///
/// Managers grow new states over time, so anything we do not recognize is
/// kept verbatim in `Other` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Online,
    Stopped,
    Errored,
    Launching,
    Stopping,
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Stopped => write!(f, "stopped"),
            Self::Errored => write!(f, "errored"),
            Self::Launching => write!(f, "launching"),
            Self::Stopping => write!(f, "stopping"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A process entry as reported by the external manager.
///
/// Entirely owned by the manager; `id` is the manager-assigned handle and
/// `pid` is only present while the OS process is running.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedProcess {
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub status: ProcessStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
    /// Epoch millis of the last start; absent means uptime reports as zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_start_millis: Option<i64>,
    pub restart_count: u32,
}

/// Rendered view of a process with derived uptime, as returned by status
/// queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSummary {
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub status: ProcessStatus,
    pub uptime_seconds: u64,
    pub restart_count: u32,
}

impl ProcessSummary {
    /// Renders a manager entry at a given wall-clock instant.
    ///
    /// Uptime is `floor((now - uptime_start_millis) / 1000)` clamped at
    /// zero, and zero when the start stamp is absent.
    pub fn render(process: &ManagedProcess, now_millis: i64) -> Self {
        let uptime_seconds = process
            .uptime_start_millis
            .map(|start| ((now_millis - start) / 1000).max(0) as u64)
            .unwrap_or(0);

        Self {
            id: process.id,
            name: process.name.clone(),
            pid: process.pid,
            status: process.status.clone(),
            uptime_seconds,
            restart_count: process.restart_count,
        }
    }
}

/// Execution mode for freshly launched processes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Fork,
    Cluster,
}

/// Request to start a process.
///
/// When `script` is absent this becomes a by-name start attempt, which only
/// succeeds if the manager already holds a saved definition for `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    /// Display name and manager registration key.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Opaque argument string passed through to the launched process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default)]
    pub exec_mode: ExecutionMode,
    #[serde(default = "default_instances")]
    pub instances: u32,
}

fn default_instances() -> u32 {
    1
}

impl StartRequest {
    /// A by-name start request with all launch fields defaulted.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: None,
            args: None,
            cwd: None,
            exec_mode: ExecutionMode::default(),
            instances: 1,
        }
    }
}

/// Result of a completed update workflow (pull + restart + log tail).
///
/// Assembled only when the pull and restart stages both succeeded;
/// `logs_tail` carries a placeholder when log retrieval failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub process_name: String,
    pub working_directory: String,
    pub git_output: String,
    pub logs_tail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(uptime_start_millis: Option<i64>) -> ManagedProcess {
        ManagedProcess {
            id: 3,
            name: "api".to_string(),
            pid: Some(4242),
            status: ProcessStatus::Online,
            working_directory: Some(PathBuf::from("/srv/api")),
            uptime_start_millis,
            restart_count: 7,
        }
    }

    #[test]
    fn summary_derives_uptime_seconds() {
        let summary = ProcessSummary::render(&process(Some(10_000)), 73_500);
        assert_eq!(summary.uptime_seconds, 63);
    }

    #[test]
    fn summary_uptime_is_zero_without_start_stamp() {
        let summary = ProcessSummary::render(&process(None), 73_500);
        assert_eq!(summary.uptime_seconds, 0);
    }

    #[test]
    fn summary_uptime_clamps_negative_to_zero() {
        // Clock skew between this host and the manager must not underflow.
        let summary = ProcessSummary::render(&process(Some(90_000)), 73_500);
        assert_eq!(summary.uptime_seconds, 0);
    }

    #[test]
    fn start_request_defaults() {
        let req: StartRequest =
            serde_json::from_str(r#"{"name":"api","script":"server.js"}"#).unwrap();
        assert_eq!(req.exec_mode, ExecutionMode::Fork);
        assert_eq!(req.instances, 1);
        assert!(req.args.is_none());
    }

    #[test]
    fn status_round_trips_unknown_states() {
        let status: ProcessStatus = serde_json::from_str(r#""one-launch-status""#).unwrap();
        assert_eq!(status, ProcessStatus::Other("one-launch-status".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), r#""one-launch-status""#);
    }
}
