//! Traits describing the process-manager command surface.

use async_trait::async_trait;
use procgate_common::{ManagedProcess, Result, StartRequest};
use std::sync::Arc;

/// Opens connections to the external process manager.
///
/// Connections are per-request: acquired fresh, never pooled or shared
/// across requests.
#[async_trait]
pub trait ManagerClient: Send + Sync {
    /// Opens a connection. Failure here is a transport error and must
    /// short-circuit before any command is attempted.
    async fn connect(&self) -> Result<Arc<dyn ManagerSession>>;
}

/// A live connection to the process manager.
///
/// All methods take a caller-supplied token where the manager accepts
/// either a numeric id or a process name.
#[async_trait]
pub trait ManagerSession: Send + Sync {
    /// Lists every process the manager holds.
    async fn list(&self) -> Result<Vec<ManagedProcess>>;

    /// Describes the process(es) matching the token. An empty result means
    /// the token resolved to nothing; that is not an error at this layer.
    async fn describe(&self, token: &str) -> Result<Vec<ManagedProcess>>;

    /// Starts a process: by saved name when `script` is absent, as a fresh
    /// launch otherwise. Returns the started process descriptor.
    async fn start(&self, request: &StartRequest) -> Result<ManagedProcess>;

    /// Stops the process matching the token.
    async fn stop(&self, token: &str) -> Result<()>;

    /// Restarts the process matching the token.
    async fn restart(&self, token: &str) -> Result<()>;

    /// Releases the connection. Best-effort; failures are logged by the
    /// gateway and never surfaced as the primary error.
    async fn disconnect(&self) -> Result<()>;
}
