//! Worker handle.
//!
//! One handle per worker process: the shared writer for requests, the
//! startup handshake, and a single reader task that parses every output
//! line once and routes it by id to the table of pending calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Child;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use agent_core::ToolDescriptor;

use crate::error::{Result, WorkerError};
use crate::protocol::{self, JsonRpcRequest, JsonRpcResponse, CALL_TOOL, HANDSHAKE_ID, LIST_TOOLS};

type Reply = Result<Value>;
type PendingCalls = Arc<Mutex<HashMap<u64, oneshot::Sender<Reply>>>>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A worker owned by the process manager
pub struct WorkerHandle {
    name: String,
    writer: tokio::sync::Mutex<Writer>,
    child: tokio::sync::Mutex<Option<Child>>,
    pid: Option<u32>,
    /// Set once by the handshake, never cleared
    ready: AtomicBool,
    /// Cleared when the output stream closes or the worker is shut down
    running: Arc<AtomicBool>,
    tools: OnceLock<Vec<ToolDescriptor>>,
    pending: PendingCalls,
    next_id: AtomicU64,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerHandle {
    pub(crate) fn new(name: &str, writer: Writer, child: Option<Child>) -> Self {
        let pid = child.as_ref().and_then(Child::id);
        Self {
            name: name.to_string(),
            writer: tokio::sync::Mutex::new(writer),
            child: tokio::sync::Mutex::new(child),
            pid,
            ready: AtomicBool::new(false),
            running: Arc::new(AtomicBool::new(true)),
            tools: OnceLock::new(),
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(HANDSHAKE_ID + 1),
            reader: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// OS process id, `None` for stream-attached workers
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Whether the handshake has completed
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Whether the worker's output stream is still open
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Advertised tools in advertised order; empty until ready
    pub fn tools(&self) -> &[ToolDescriptor] {
        self.tools.get().map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of calls awaiting a response
    pub fn pending_calls(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Send `tools/list` and read the worker's first output line as the answer
    pub(crate) async fn handshake<R>(&self, reader: &mut R, timeout: Duration) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let request = JsonRpcRequest::new(HANDSHAKE_ID, LIST_TOOLS, serde_json::json!({}));
        self.write(&request).await?;

        let mut line = Vec::new();
        match tokio::time::timeout(timeout, reader.read_until(b'\n', &mut line)).await {
            Err(_) => {
                return Err(WorkerError::StartupTimeout {
                    name: self.name.clone(),
                    timeout_ms: millis(timeout),
                });
            }
            Ok(Err(e)) => {
                return Err(self.handshake_error(format!("failed to read output: {e}")));
            }
            Ok(Ok(0)) => {
                return Err(self.handshake_error("output closed before the handshake response"));
            }
            Ok(Ok(_)) => {}
        }

        let line = std::str::from_utf8(&line)
            .map_err(|e| self.handshake_error(format!("output is not UTF-8: {e}")))?;
        let tools = protocol::parse_list_tools(line).map_err(|reason| self.handshake_error(reason))?;
        if self.tools.set(tools).is_err() {
            return Err(self.handshake_error("handshake already completed"));
        }
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    fn handshake_error(&self, reason: impl Into<String>) -> WorkerError {
        WorkerError::HandshakeParse {
            name: self.name.clone(),
            reason: reason.into(),
        }
    }

    /// Start the demultiplexing reader over the rest of the output stream
    pub(crate) fn start_reader<R>(&self, reader: R)
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        let task = tokio::spawn(demultiplex(
            self.name.clone(),
            reader,
            Arc::clone(&self.pending),
            Arc::clone(&self.running),
        ));
        *lock(&self.reader) = Some(task);
    }

    /// Call `tool` and wait up to `timeout` for the matching response
    ///
    /// Resolves with the response's `result` field.
    pub async fn call_tool(&self, tool: &str, arguments: Value, timeout: Duration) -> Result<Value> {
        if !self.is_ready() {
            return Err(WorkerError::WorkerNotReady(self.name.clone()));
        }
        if !self.is_running() {
            return Err(WorkerError::WorkerExited(self.name.clone()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(
            id,
            CALL_TOOL,
            serde_json::json!({ "name": tool, "arguments": arguments }),
        );

        // Registered before the write so a fast response cannot be missed
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id, tx);
        let _entry = PendingEntry {
            id,
            pending: &self.pending,
        };

        if !self.is_running() {
            return Err(WorkerError::WorkerExited(self.name.clone()));
        }

        tracing::debug!(worker = %self.name, tool, id, "Sending tools/call");
        self.write(&request).await?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(WorkerError::WorkerExited(self.name.clone())),
            Err(_) => {
                tracing::warn!(worker = %self.name, tool, id, "Tool call timed out");
                Err(WorkerError::CallTimeout {
                    worker: self.name.clone(),
                    tool: tool.to_string(),
                    timeout_ms: millis(timeout),
                })
            }
        }
    }

    async fn write(&self, request: &JsonRpcRequest) -> Result<()> {
        let line = protocol::encode_line(request).map_err(|e| self.transport_error(&e))?;

        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| self.transport_error(&e))?;
        writer.flush().await.map_err(|e| self.transport_error(&e))?;
        Ok(())
    }

    fn transport_error(&self, err: &dyn std::fmt::Display) -> WorkerError {
        WorkerError::Transport {
            worker: self.name.clone(),
            reason: err.to_string(),
        }
    }

    /// Kill the process (if any), stop the reader and fail outstanding calls
    pub async fn shutdown(&self) {
        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(e) = child.kill().await {
                tracing::warn!(worker = %self.name, error = %e, "Failed to kill worker");
            } else {
                tracing::info!(worker = %self.name, "Worker stopped");
            }
        }

        if let Some(task) = lock(&self.reader).take() {
            task.abort();
        }

        self.running.store(false, Ordering::Release);
        fail_pending(&self.name, &self.pending);
    }
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("name", &self.name)
            .field("pid", &self.pid)
            .field("ready", &self.is_ready())
            .field("running", &self.is_running())
            .field("tools", &self.tools().len())
            .finish_non_exhaustive()
    }
}

/// Removes a call from the pending table when the call finishes or is dropped
struct PendingEntry<'a> {
    id: u64,
    pending: &'a PendingCalls,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        lock(self.pending).remove(&self.id);
    }
}

async fn demultiplex<R>(worker: String, mut reader: R, pending: PendingCalls, running: Arc<AtomicBool>)
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => {
                tracing::warn!(worker = %worker, "Worker output closed");
                break;
            }
            Ok(_) => dispatch_line(&worker, &line, &pending),
            Err(e) => {
                tracing::warn!(worker = %worker, error = %e, "Failed to read worker output");
                break;
            }
        }
    }

    running.store(false, Ordering::Release);
    fail_pending(&worker, &pending);
}

/// Route one output line to the pending call it answers
///
/// Lines that cannot be attributed to a pending call are dropped and never
/// affect any other call.
fn dispatch_line(worker: &str, line: &[u8], pending: &PendingCalls) {
    let line = line.trim_ascii();
    if line.is_empty() {
        return;
    }

    let value: Value = match serde_json::from_slice(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(worker, error = %e, "Discarding unparsable output line");
            return;
        }
    };

    let Some(id) = value.get("id").and_then(Value::as_u64) else {
        tracing::debug!(worker, "Discarding output line without a numeric id");
        return;
    };

    let Some(tx) = lock(pending).remove(&id) else {
        tracing::debug!(worker, id, "No pending call for response, dropping");
        return;
    };

    // The receiver may have timed out in the meantime
    let _ = tx.send(decode_reply(worker, value));
}

fn decode_reply(worker: &str, value: Value) -> Reply {
    let response: JsonRpcResponse =
        serde_json::from_value(value).map_err(|e| WorkerError::MalformedResponse {
            worker: worker.to_string(),
            reason: e.to_string(),
        })?;

    if let Some(err) = response.error {
        return Err(WorkerError::ServerError {
            worker: worker.to_string(),
            code: err.code,
            message: err.message,
        });
    }

    response.result.ok_or_else(|| WorkerError::MalformedResponse {
        worker: worker.to_string(),
        reason: "response has neither result nor error".into(),
    })
}

fn fail_pending(worker: &str, pending: &PendingCalls) {
    let orphaned: Vec<_> = lock(pending).drain().collect();
    for (_, tx) in orphaned {
        let _ = tx.send(Err(WorkerError::WorkerExited(worker.to_string())));
    }
}
