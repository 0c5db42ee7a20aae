//! Scripted executor for tests.
//!
//! Responses are matched by program name plus the first argument (the
//! subcommand), which is enough to tell `git stash` from `git pull` and
//! `pm2 jlist` from `pm2 restart`. Every invocation is recorded so tests
//! can assert on what would have run.

use crate::{CommandExecutor, CommandOutput, CommandSpec};
use async_trait::async_trait;
use procgate_common::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;

enum Scripted {
    Output(CommandOutput),
    Fail(String),
}

/// Deterministic [`CommandExecutor`] that never spawns a subprocess.
#[derive(Default)]
pub struct MockExecutor {
    responses: Mutex<HashMap<String, Scripted>>,
    invocations: Mutex<Vec<CommandSpec>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(spec: &CommandSpec) -> String {
        match spec.args.first() {
            Some(first) => format!("{} {}", spec.program, first),
            None => spec.program.clone(),
        }
    }

    /// Scripts a successful invocation for `program subcommand`.
    pub fn succeed(self, key: &str, stdout: &str) -> Self {
        self.responses.lock().unwrap().insert(
            key.to_string(),
            Scripted::Output(CommandOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_code: 0,
            }),
        );
        self
    }

    /// Scripts a non-zero exit with the given stderr.
    pub fn fail_with_stderr(self, key: &str, stderr: &str) -> Self {
        self.responses.lock().unwrap().insert(
            key.to_string(),
            Scripted::Output(CommandOutput {
                stdout: String::new(),
                stderr: stderr.to_string(),
                exit_code: 1,
            }),
        );
        self
    }

    /// Scripts a transport-level failure (spawn error, timeout).
    pub fn fail_transport(self, key: &str, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(key.to_string(), Scripted::Fail(message.to_string()));
        self
    }

    /// All invocations seen so far, in order.
    pub fn invocations(&self) -> Vec<CommandSpec> {
        self.invocations.lock().unwrap().clone()
    }

    /// Number of invocations whose key matches `key`.
    pub fn count(&self, key: &str) -> usize {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .filter(|spec| Self::key(spec) == key)
            .count()
    }
}

#[async_trait]
impl CommandExecutor for MockExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.invocations.lock().unwrap().push(spec.clone());
        let key = Self::key(spec);
        match self.responses.lock().unwrap().get(&key) {
            Some(Scripted::Output(output)) => Ok(output.clone()),
            Some(Scripted::Fail(message)) => Err(Error::transport(message.clone())),
            None => Ok(CommandOutput {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: 0,
            }),
        }
    }
}
