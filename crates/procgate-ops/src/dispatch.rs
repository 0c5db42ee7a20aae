//! The seven gateway operations, each a thin protocol over the session
//! gateway.

use crate::resolve::{self, Resolution};
use chrono::Utc;
use procgate_common::{Error, ManagedProcess, Result, StartRequest};
use procgate_exec::{CommandExecutor, CommandSpec};
use procgate_manager::{with_manager_session, ManagerClient};
use tracing::info;

/// Default number of log lines when the caller does not say.
pub const DEFAULT_LOG_LINES: usize = 30;

/// Result of a restart: the process existed and the restart command was
/// issued.
#[derive(Debug, Clone)]
pub struct RestartReceipt {
    pub id: u64,
    pub name: String,
}

/// Status query: lists all processes and applies the resolver.
pub async fn status(manager: &dyn ManagerClient, token: &str) -> Result<Resolution> {
    with_manager_session(manager, |session| async move {
        let processes = session.list().await?;
        resolve::resolve(token, &processes, Utc::now().timestamp_millis())
    })
    .await
}

/// Describes a single process; an empty descriptor set is NotFound.
pub async fn describe(manager: &dyn ManagerClient, token: &str) -> Result<ManagedProcess> {
    with_manager_session(manager, |session| async move {
        session
            .describe(token)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(token))
    })
    .await
}

/// Restarts a process after confirming it exists.
///
/// The existence check and the restart are two separate manager calls with
/// no atomicity between them; a concurrently removed process surfaces as a
/// transport error from the restart call, not as NotFound.
pub async fn restart(manager: &dyn ManagerClient, token: &str) -> Result<RestartReceipt> {
    with_manager_session(manager, |session| async move {
        let process = session
            .describe(token)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(token))?;

        session.restart(token).await?;
        info!("Restarted process '{}' (id {})", process.name, process.id);

        Ok(RestartReceipt {
            id: process.id,
            name: process.name,
        })
    })
    .await
}

/// Stops a process. No existence pre-check: the manager's own error is the
/// answer for unknown tokens.
pub async fn stop(manager: &dyn ManagerClient, token: &str) -> Result<()> {
    with_manager_session(manager, |session| async move {
        session.stop(token).await?;
        info!("Stopped process '{}'", token);
        Ok(())
    })
    .await
}

/// Starts a process from a request.
///
/// Without a script this is a by-name attempt against a saved manager
/// definition, and a manager failure there is the caller's fault (400)
/// rather than a transport problem.
pub async fn start(manager: &dyn ManagerClient, request: &StartRequest) -> Result<ManagedProcess> {
    with_manager_session(manager, |session| async move {
        match session.start(request).await {
            Ok(process) => {
                info!("Started process '{}' (id {})", process.name, process.id);
                Ok(process)
            }
            Err(e) if request.script.is_none() => Err(Error::validation_with_details(
                format!(
                    "No script provided and no saved process definition for '{}'",
                    request.name
                ),
                e.display_detail(),
            )),
            Err(e) => Err(e),
        }
    })
    .await
}

/// Fetches a bounded, non-streaming log tail for the named process.
pub async fn logs(
    executor: &dyn CommandExecutor,
    pm2_bin: &str,
    token: &str,
    lines: usize,
) -> Result<String> {
    let lines = lines.to_string();
    let spec = CommandSpec::new(
        pm2_bin,
        &["logs", token, "--lines", &lines, "--nostream", "--raw"],
    );
    let output = executor.execute(&spec).await?.require_success("pm2 logs")?;
    Ok(output.stdout)
}

/// Best-effort parse of a `lines` query value. Anything non-numeric falls
/// back to the default; parse failures must never error the request.
pub fn parse_lines(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}
