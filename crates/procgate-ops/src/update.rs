//! The update workflow: pull latest source, restart, tail the logs.
//!
//! Stages run in strict sequence, each a precondition for the next, and a
//! failure terminates the chain with that stage's error. Nothing is rolled
//! back: a pull that landed stays landed even when the restart after it
//! fails, and the error report carries the pull output so the caller can
//! see how far the chain got.

use crate::dispatch;
use procgate_common::{Error, Result, UpdateOutcome};
use procgate_exec::{CommandExecutor, CommandSpec};
use procgate_manager::{with_manager_session, ManagerClient};
use std::path::PathBuf;
use tracing::{info, warn};

/// Substituted for the log tail when log retrieval fails.
pub const LOG_FAILURE_PLACEHOLDER: &str = "(log retrieval failed)";

/// An update failure, carrying the pull output when the chain got that far.
#[derive(Debug)]
pub struct UpdateError {
    pub error: Error,
    pub git_output: Option<String>,
}

impl From<Error> for UpdateError {
    fn from(error: Error) -> Self {
        Self {
            error,
            git_output: None,
        }
    }
}

/// Runs the full update chain for the process matching `token`.
///
/// The manager connection used to resolve the target is released before the
/// git subprocesses run; the restart stage opens its own connection.
/// `tail_lines` bounds the terminal log stage.
pub async fn update(
    manager: &dyn ManagerClient,
    executor: &dyn CommandExecutor,
    pm2_bin: &str,
    token: &str,
    tail_lines: usize,
) -> std::result::Result<UpdateOutcome, UpdateError> {
    // Stage 1+2: resolve the target and locate its working directory.
    let (name, cwd) = resolve_target(manager, token).await?;
    let cwd = cwd.ok_or_else(|| Error::validation("working directory unknown"))?;

    // Stage 3: discard local modifications and pull, outside any manager
    // connection.
    let git_output = pull_latest(executor, &cwd).await?;
    info!("Pulled latest source for '{}' in {}", name, cwd.display());

    // Stage 4: restart through a fresh session. The pull already happened,
    // so its output rides along on failure.
    let restarted =
        with_manager_session(manager, |session| async move { session.restart(token).await })
            .await;
    if let Err(error) = restarted {
        return Err(UpdateError {
            error,
            git_output: Some(git_output),
        });
    }

    // Stage 5: best-effort tail; failure never fails the update.
    let logs_tail = match dispatch::logs(executor, pm2_bin, &name, tail_lines).await {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!("Log tail after update of '{}' failed: {}", name, e);
            LOG_FAILURE_PLACEHOLDER.to_string()
        }
    };

    Ok(UpdateOutcome {
        process_name: name,
        working_directory: cwd.display().to_string(),
        git_output,
        logs_tail,
    })
}

async fn resolve_target(
    manager: &dyn ManagerClient,
    token: &str,
) -> Result<(String, Option<PathBuf>)> {
    with_manager_session(manager, |session| async move {
        let process = session
            .describe(token)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(token))?;
        Ok((process.name, process.working_directory))
    })
    .await
}

async fn pull_latest(executor: &dyn CommandExecutor, cwd: &std::path::Path) -> Result<String> {
    executor
        .execute(&CommandSpec::new("git", &["stash", "--include-untracked"]).in_dir(cwd))
        .await?
        .require_success("git stash")?;

    let pull = executor
        .execute(&CommandSpec::new("git", &["pull"]).in_dir(cwd))
        .await?
        .require_success("git pull")?;

    Ok(pull.stdout.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use procgate_common::{ManagedProcess, ProcessStatus};
    use procgate_exec::mock::MockExecutor;
    use procgate_manager::mock::{MockCall, MockManager};

    fn api_process(cwd: Option<&str>) -> ManagedProcess {
        ManagedProcess {
            id: 0,
            name: "api".to_string(),
            pid: Some(4321),
            status: ProcessStatus::Online,
            working_directory: cwd.map(Into::into),
            uptime_start_millis: Some(0),
            restart_count: 2,
        }
    }

    #[tokio::test]
    async fn full_chain_bundles_pull_output_and_log_tail() {
        let manager = MockManager::new(vec![api_process(Some("/srv/api"))]);
        let executor = MockExecutor::new()
            .succeed("git stash", "No local changes to save\n")
            .succeed("git pull", "Already up to date.\n")
            .succeed("pm2 logs", "server started\n");

        let outcome = update(&manager, &executor, "pm2", "api", 10).await.unwrap();
        assert_eq!(outcome.process_name, "api");
        assert_eq!(outcome.working_directory, "/srv/api");
        assert_eq!(outcome.git_output, "Already up to date.");
        assert_eq!(outcome.logs_tail, "server started");

        // Both git commands ran in the process's working directory.
        for spec in executor.invocations().iter().filter(|s| s.program == "git") {
            assert_eq!(spec.cwd.as_deref().unwrap().to_str(), Some("/srv/api"));
        }

        // Two gateway uses (resolve, restart), each released.
        assert_eq!(manager.connect_count(), 2);
        assert_eq!(manager.disconnect_count(), 2);
    }

    #[tokio::test]
    async fn unknown_token_fails_before_any_side_effect() {
        let manager = MockManager::new(vec![api_process(Some("/srv/api"))]);
        let executor = MockExecutor::new();

        let err = update(&manager, &executor, "pm2", "ghost", 10).await.unwrap_err();
        assert!(matches!(err.error, Error::ProcessNotFound { .. }));
        assert!(err.git_output.is_none());
        assert!(executor.invocations().is_empty());
        assert_eq!(manager.mutation_count(), 0);
    }

    #[tokio::test]
    async fn missing_working_directory_is_a_validation_error() {
        let manager = MockManager::new(vec![api_process(None)]);
        let executor = MockExecutor::new();

        let err = update(&manager, &executor, "pm2", "api", 10).await.unwrap_err();
        match err.error {
            Error::Validation { message, .. } => {
                assert_eq!(message, "working directory unknown")
            }
            other => panic!("expected Validation, got {:?}", other),
        }
        assert!(executor.invocations().is_empty());
    }

    #[tokio::test]
    async fn pull_failure_short_circuits_before_restart() {
        let manager = MockManager::new(vec![api_process(Some("/srv/api"))]);
        let executor = MockExecutor::new()
            .succeed("git stash", "")
            .fail_with_stderr("git pull", "fatal: unable to access remote");

        let err = update(&manager, &executor, "pm2", "api", 10).await.unwrap_err();
        assert_eq!(err.error.display_detail(), "fatal: unable to access remote");

        let restarts = manager
            .calls()
            .iter()
            .filter(|c| matches!(c, MockCall::Restart(_)))
            .count();
        assert_eq!(restarts, 0);
    }

    #[tokio::test]
    async fn restart_failure_still_reports_the_pull_output() {
        let manager =
            MockManager::new(vec![api_process(Some("/srv/api"))]).fail_restart("spawn error");
        let executor = MockExecutor::new()
            .succeed("git stash", "")
            .succeed("git pull", "Already up to date.\n");

        let err = update(&manager, &executor, "pm2", "api", 10).await.unwrap_err();
        assert_eq!(err.error.display_detail(), "spawn error");
        assert_eq!(err.git_output.as_deref(), Some("Already up to date."));
        assert_eq!(manager.connect_count(), manager.disconnect_count());
    }

    #[tokio::test]
    async fn log_tail_failure_does_not_fail_the_update() {
        let manager = MockManager::new(vec![api_process(Some("/srv/api"))]);
        let executor = MockExecutor::new()
            .succeed("git stash", "")
            .succeed("git pull", "Updating 1a2b3c..4d5e6f\n")
            .fail_with_stderr("pm2 logs", "tail broke");

        let outcome = update(&manager, &executor, "pm2", "api", 10).await.unwrap();
        assert_eq!(outcome.logs_tail, LOG_FAILURE_PLACEHOLDER);
        assert_eq!(outcome.git_output, "Updating 1a2b3c..4d5e6f");
    }

    #[tokio::test]
    async fn tail_is_bounded_to_the_requested_line_count() {
        let manager = MockManager::new(vec![api_process(Some("/srv/api"))]);
        let executor = MockExecutor::new()
            .succeed("git stash", "")
            .succeed("git pull", "Already up to date.\n")
            .succeed("pm2 logs", "ok\n");

        update(&manager, &executor, "pm2", "api", 7).await.unwrap();

        let tail = executor
            .invocations()
            .into_iter()
            .find(|s| s.args.first().map(String::as_str) == Some("logs"))
            .unwrap();
        assert_eq!(
            tail.args,
            vec!["logs", "api", "--lines", "7", "--nostream", "--raw"]
        );
    }
}
