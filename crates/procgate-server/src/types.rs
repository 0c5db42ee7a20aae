//! Wire types for the HTTP surface.

use procgate_common::{ExecutionMode, ManagedProcess, ProcessSummary, StartRequest};
use serde::{Deserialize, Serialize};

/// `GET /status/all` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessListResponse {
    pub count: usize,
    pub processes: Vec<ProcessSummary>,
}

/// `POST /restart/{id}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestartResponse {
    pub message: String,
    pub id: u64,
    pub name: String,
}

/// `POST /stop/{id}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopResponse {
    pub message: String,
}

/// `POST /start/{name}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartResponse {
    pub message: String,
    pub proc: ManagedProcess,
}

/// `POST /update/{id}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub message: String,
    pub cwd: String,
    pub git_output: String,
    pub logs: String,
}

/// Error payload: the failure text plus, where available, auxiliary
/// context (manager detail on 400s, pull output on failed updates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_output: Option<String>,
}

/// `POST /start/{name}` body. Everything is optional; the name rides in
/// the path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartBody {
    pub script: Option<String>,
    pub args: Option<String>,
    pub cwd: Option<String>,
    pub exec_mode: Option<ExecutionMode>,
    pub instances: Option<u32>,
}

impl StartBody {
    /// Combines the path name with the body fields into a start request.
    pub fn into_request(self, name: String) -> StartRequest {
        StartRequest {
            name,
            script: self.script,
            args: self.args,
            cwd: self.cwd,
            exec_mode: self.exec_mode.unwrap_or_default(),
            instances: self.instances.unwrap_or(1),
        }
    }
}

/// `GET /logs/{id}` query string. `lines` stays a raw string so a
/// non-numeric value can fall back to the default instead of erroring.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsQuery {
    pub lines: Option<String>,
}
