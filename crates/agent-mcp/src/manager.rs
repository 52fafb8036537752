//! Process manager.
//!
//! Owns the set of worker processes: launches them, performs the startup
//! handshake, routes tool calls to them and guarantees their termination.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::process::{Child, ChildStderr, Command};

use agent_core::catalog::{is_valid_worker_name, QualifiedTool, ToolCatalog, ToolHost};
use agent_core::{AgentError, CallToolResult};

use crate::error::{Result, WorkerError};
use crate::worker::WorkerHandle;

/// Handshake bound
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-call response bound
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Process manager configuration
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// How long a worker may take to answer the handshake
    pub startup_timeout: Duration,

    /// How long a tool call may take
    pub call_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl ManagerConfig {
    pub fn from_env() -> Self {
        let millis = |key: &str| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
        };

        let defaults = Self::default();
        Self {
            startup_timeout: millis("WORKER_STARTUP_TIMEOUT_MS").unwrap_or(defaults.startup_timeout),
            call_timeout: millis("WORKER_CALL_TIMEOUT_MS").unwrap_or(defaults.call_timeout),
        }
    }
}

/// How to launch a worker process
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Program to execute
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Working directory
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl LaunchSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args).envs(&self.env);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// Health snapshot of one worker
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkerStatus {
    pub name: String,
    pub ready: bool,
    pub tool_count: usize,
    pub running: bool,
}

/// Owns every worker, keyed by name, in start order
pub struct ProcessManager {
    workers: RwLock<Vec<Arc<WorkerHandle>>>,
    config: ManagerConfig,
}

impl Default for ProcessManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl ProcessManager {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            workers: RwLock::new(Vec::new()),
            config,
        }
    }

    pub const fn config(&self) -> &ManagerConfig {
        &self.config
    }

    fn read_workers(&self) -> RwLockReadGuard<'_, Vec<Arc<WorkerHandle>>> {
        self.workers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_workers(&self) -> RwLockWriteGuard<'_, Vec<Arc<WorkerHandle>>> {
        self.workers.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if !is_valid_worker_name(name) {
            return Err(WorkerError::InvalidName(name.to_string()));
        }
        if self.get_worker(name).is_some() {
            return Err(WorkerError::DuplicateWorker(name.to_string()));
        }
        Ok(())
    }

    /// Launch a worker process and complete its handshake
    pub async fn start_worker(&self, name: &str, spec: &LaunchSpec) -> Result<Arc<WorkerHandle>> {
        self.check_name(name)?;

        let mut child = spec
            .to_command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WorkerError::SpawnFailed {
                name: name.to_string(),
                reason: format!("{}: {e}", spec.command),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| WorkerError::SpawnFailed {
            name: name.to_string(),
            reason: "failed to capture stdin".into(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| WorkerError::SpawnFailed {
            name: name.to_string(),
            reason: "failed to capture stdout".into(),
        })?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(name.to_string(), stderr));
        }

        tracing::info!(worker = name, pid = ?child.id(), command = %spec.command, "Spawned worker");

        self.register(name, stdout, stdin, Some(child)).await
    }

    /// Attach a worker that speaks the protocol over the given streams
    pub async fn attach<R, W>(&self, name: &str, reader: R, writer: W) -> Result<Arc<WorkerHandle>>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        self.check_name(name)?;
        self.register(name, reader, writer, None).await
    }

    async fn register<R, W>(
        &self,
        name: &str,
        reader: R,
        writer: W,
        child: Option<Child>,
    ) -> Result<Arc<WorkerHandle>>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let handle = Arc::new(WorkerHandle::new(name, Box::new(writer), child));
        {
            let mut workers = self.write_workers();
            if workers.iter().any(|w| w.name() == name) {
                return Err(WorkerError::DuplicateWorker(name.to_string()));
            }
            workers.push(Arc::clone(&handle));
        }

        let mut reader = BufReader::new(reader);
        match handle.handshake(&mut reader, self.config.startup_timeout).await {
            Ok(()) => {
                handle.start_reader(reader);
                tracing::info!(worker = name, tools = handle.tools().len(), "Worker ready");
                Ok(handle)
            }
            Err(e) => {
                tracing::error!(worker = name, error = %e, "Worker failed to start");
                self.write_workers().retain(|w| !Arc::ptr_eq(w, &handle));
                handle.shutdown().await;
                Err(e)
            }
        }
    }

    /// Handle for `name`, ready or not
    pub fn get_worker(&self, name: &str) -> Option<Arc<WorkerHandle>> {
        self.read_workers().iter().find(|w| w.name() == name).cloned()
    }

    /// Whether `name` exists and completed its handshake
    pub fn is_ready(&self, name: &str) -> bool {
        self.get_worker(name).is_some_and(|w| w.is_ready())
    }

    /// Call a tool on a ready worker; resolves with the response's `result`
    pub async fn call_tool(&self, worker: &str, tool: &str, arguments: Value) -> Result<Value> {
        let handle = self
            .get_worker(worker)
            .filter(|w| w.is_ready())
            .ok_or_else(|| WorkerError::WorkerNotReady(worker.to_string()))?;

        handle.call_tool(tool, arguments, self.config.call_timeout).await
    }

    /// Every ready worker's tools, workers in start order, tools in advertised order
    pub fn get_all_tools(&self) -> Vec<QualifiedTool> {
        self.read_workers()
            .iter()
            .filter(|w| w.is_ready())
            .flat_map(|w| {
                w.tools()
                    .iter()
                    .map(|tool| QualifiedTool::new(w.name(), tool.clone()))
            })
            .collect()
    }

    pub fn health(&self) -> Vec<WorkerStatus> {
        self.read_workers()
            .iter()
            .map(|w| WorkerStatus {
                name: w.name().to_string(),
                ready: w.is_ready(),
                tool_count: w.tools().len(),
                running: w.is_running(),
            })
            .collect()
    }

    /// Terminate every owned worker; safe to call more than once
    pub async fn shutdown(&self) {
        let workers: Vec<_> = self.write_workers().drain(..).collect();
        if workers.is_empty() {
            return;
        }

        tracing::info!(count = workers.len(), "Shutting down workers");
        for worker in workers {
            worker.shutdown().await;
        }
    }
}

#[async_trait]
impl ToolHost for ProcessManager {
    fn catalog(&self) -> ToolCatalog {
        ToolCatalog::new(self.get_all_tools())
    }

    async fn call_tool(&self, worker: &str, tool: &str, arguments: Value) -> agent_core::Result<CallToolResult> {
        let result = Self::call_tool(self, worker, tool, arguments).await?;

        serde_json::from_value(result).map_err(|e| AgentError::MalformedResponse {
            worker: worker.to_string(),
            reason: format!("unexpected tools/call result: {e}"),
        })
    }
}

/// Forward a worker's diagnostic output to the log
async fn forward_stderr(worker: String, stderr: ChildStderr) {
    let mut reader = BufReader::new(stderr);
    let mut line = Vec::new();
    while matches!(reader.read_until(b'\n', &mut line).await, Ok(n) if n > 0) {
        let text = String::from_utf8_lossy(&line);
        let text = text.trim();
        if !text.is_empty() {
            tracing::info!(worker = %worker, "{text}");
        }
        line.clear();
    }
}
