//! In-memory manager for tests.
//!
//! Holds a fixed process list, records every call in order, and can be
//! scripted to fail at any point of the surface. Connection open/close
//! counts are exposed so tests can assert the no-leak property.

use crate::client::{ManagerClient, ManagerSession};
use async_trait::async_trait;
use procgate_common::{Error, ManagedProcess, Result, StartRequest};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One observed call against the mock manager surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Connect,
    List,
    Describe(String),
    Start(String),
    Stop(String),
    Restart(String),
    Disconnect,
}

#[derive(Default)]
struct FailPlan {
    connect: Option<String>,
    disconnect: Option<String>,
    list: Option<String>,
    start: Option<String>,
    stop: Option<String>,
    restart: Option<String>,
}

struct MockState {
    processes: Mutex<Vec<ManagedProcess>>,
    fail: FailPlan,
    calls: Mutex<Vec<MockCall>>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

/// Scriptable [`ManagerClient`] for tests.
pub struct MockManager {
    state: Arc<MockState>,
}

impl MockManager {
    pub fn new(processes: Vec<ManagedProcess>) -> Self {
        Self {
            state: Arc::new(MockState {
                processes: Mutex::new(processes),
                fail: FailPlan::default(),
                calls: Mutex::new(Vec::new()),
                connects: AtomicUsize::new(0),
                disconnects: AtomicUsize::new(0),
            }),
        }
    }

    fn with_fail(mut self, f: impl FnOnce(&mut FailPlan)) -> Self {
        let state = Arc::get_mut(&mut self.state)
            .expect("failure plan must be set before the mock is shared");
        f(&mut state.fail);
        self
    }

    pub fn fail_connect(self, message: &str) -> Self {
        let message = message.to_string();
        self.with_fail(|fail| fail.connect = Some(message))
    }

    pub fn fail_disconnect(self, message: &str) -> Self {
        let message = message.to_string();
        self.with_fail(|fail| fail.disconnect = Some(message))
    }

    pub fn fail_list(self, message: &str) -> Self {
        let message = message.to_string();
        self.with_fail(|fail| fail.list = Some(message))
    }

    pub fn fail_start(self, message: &str) -> Self {
        let message = message.to_string();
        self.with_fail(|fail| fail.start = Some(message))
    }

    pub fn fail_stop(self, message: &str) -> Self {
        let message = message.to_string();
        self.with_fail(|fail| fail.stop = Some(message))
    }

    pub fn fail_restart(self, message: &str) -> Self {
        let message = message.to_string();
        self.with_fail(|fail| fail.restart = Some(message))
    }

    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.state.disconnects.load(Ordering::SeqCst)
    }

    /// All calls observed so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.calls.lock().unwrap().clone()
    }

    /// Number of mutating calls (start/stop/restart) observed.
    pub fn mutation_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    MockCall::Start(_) | MockCall::Stop(_) | MockCall::Restart(_)
                )
            })
            .count()
    }
}

#[async_trait]
impl ManagerClient for MockManager {
    async fn connect(&self) -> Result<Arc<dyn ManagerSession>> {
        self.state.calls.lock().unwrap().push(MockCall::Connect);
        if let Some(ref message) = self.state.fail.connect {
            return Err(Error::transport(message.clone()));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockSession {
    state: Arc<MockState>,
}

impl MockSession {
    fn matches(process: &ManagedProcess, token: &str) -> bool {
        process.id.to_string() == token || process.name == token
    }
}

#[async_trait]
impl ManagerSession for MockSession {
    async fn list(&self) -> Result<Vec<ManagedProcess>> {
        self.state.calls.lock().unwrap().push(MockCall::List);
        if let Some(ref message) = self.state.fail.list {
            return Err(Error::transport(message.clone()));
        }
        Ok(self.state.processes.lock().unwrap().clone())
    }

    async fn describe(&self, token: &str) -> Result<Vec<ManagedProcess>> {
        self.state
            .calls
            .lock()
            .unwrap()
            .push(MockCall::Describe(token.to_string()));
        Ok(self
            .state
            .processes
            .lock()
            .unwrap()
            .iter()
            .filter(|p| Self::matches(p, token))
            .cloned()
            .collect())
    }

    async fn start(&self, request: &StartRequest) -> Result<ManagedProcess> {
        self.state
            .calls
            .lock()
            .unwrap()
            .push(MockCall::Start(request.name.clone()));
        if let Some(ref message) = self.state.fail.start {
            return Err(Error::transport_with_stderr(
                "manager start failed",
                message.clone(),
            ));
        }

        let mut processes = self.state.processes.lock().unwrap();
        if request.script.is_none() {
            // By-name start requires a saved definition.
            return processes
                .iter()
                .find(|p| p.name == request.name)
                .cloned()
                .ok_or_else(|| {
                    Error::transport_with_stderr(
                        "manager start failed",
                        format!("process or namespace '{}' not found", request.name),
                    )
                });
        }

        let process = ManagedProcess {
            id: processes.iter().map(|p| p.id).max().map_or(0, |id| id + 1),
            name: request.name.clone(),
            pid: Some(10_000),
            status: procgate_common::ProcessStatus::Online,
            working_directory: request.cwd.clone().map(Into::into),
            uptime_start_millis: None,
            restart_count: 0,
        };
        processes.push(process.clone());
        Ok(process)
    }

    async fn stop(&self, token: &str) -> Result<()> {
        self.state
            .calls
            .lock()
            .unwrap()
            .push(MockCall::Stop(token.to_string()));
        if let Some(ref message) = self.state.fail.stop {
            return Err(Error::transport_with_stderr(
                "manager stop failed",
                message.clone(),
            ));
        }
        Ok(())
    }

    async fn restart(&self, token: &str) -> Result<()> {
        self.state
            .calls
            .lock()
            .unwrap()
            .push(MockCall::Restart(token.to_string()));
        if let Some(ref message) = self.state.fail.restart {
            return Err(Error::transport_with_stderr(
                "manager restart failed",
                message.clone(),
            ));
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.state.calls.lock().unwrap().push(MockCall::Disconnect);
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        if let Some(ref message) = self.state.fail.disconnect {
            return Err(Error::transport(message.clone()));
        }
        Ok(())
    }
}
