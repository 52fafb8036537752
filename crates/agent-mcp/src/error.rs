//! Worker manager error types.

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkerError>;

/// Errors raised while starting workers or calling their tools
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Worker names must be non-empty and free of the tool-name separator
    #[error("invalid worker name '{0}'")]
    InvalidName(String),

    #[error("worker '{0}' is already registered")]
    DuplicateWorker(String),

    /// The worker process could not be launched
    #[error("failed to spawn worker '{name}': {reason}")]
    SpawnFailed { name: String, reason: String },

    /// No handshake response within the startup bound
    #[error("worker '{name}' did not answer tools/list within {timeout_ms}ms")]
    StartupTimeout { name: String, timeout_ms: u64 },

    /// The first output line was not a usable tools/list response
    #[error("worker '{name}' handshake failed: {reason}")]
    HandshakeParse { name: String, reason: String },

    /// Unknown worker, or handshake not completed
    #[error("worker '{0}' not ready")]
    WorkerNotReady(String),

    #[error("tool call '{worker}:{tool}' timed out after {timeout_ms}ms")]
    CallTimeout {
        worker: String,
        tool: String,
        timeout_ms: u64,
    },

    /// A response addressed to the call could not be used
    #[error("malformed response from worker '{worker}': {reason}")]
    MalformedResponse { worker: String, reason: String },

    /// The worker answered with a JSON-RPC error object
    #[error("worker '{worker}' returned error [{code}]: {message}")]
    ServerError {
        worker: String,
        code: i64,
        message: String,
    },

    /// The worker's output stream closed
    #[error("worker '{0}' exited")]
    WorkerExited(String),

    /// Writing to the worker failed
    #[error("transport error for worker '{worker}': {reason}")]
    Transport { worker: String, reason: String },
}

impl From<WorkerError> for AgentError {
    fn from(err: WorkerError) -> Self {
        match err {
            WorkerError::WorkerNotReady(name) => Self::WorkerNotReady(name),
            WorkerError::CallTimeout {
                worker,
                tool,
                timeout_ms,
            } => Self::ToolTimeout {
                worker,
                tool,
                timeout_ms,
            },
            WorkerError::MalformedResponse { worker, reason } => {
                Self::MalformedResponse { worker, reason }
            }
            WorkerError::ServerError {
                worker,
                code,
                message,
            } => Self::ToolServer {
                worker,
                code,
                message,
            },
            WorkerError::WorkerExited(name) => Self::WorkerExited(name),
            other => Self::ToolExecution(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_onto_run_level_kinds() {
        let err: AgentError = WorkerError::CallTimeout {
            worker: "database".into(),
            tool: "search_customer".into(),
            timeout_ms: 10_000,
        }
        .into();
        assert!(matches!(err, AgentError::ToolTimeout { timeout_ms: 10_000, .. }));

        let err: AgentError = WorkerError::WorkerNotReady("email".into()).into();
        assert!(matches!(err, AgentError::WorkerNotReady(name) if name == "email"));

        let err: AgentError = WorkerError::Transport {
            worker: "email".into(),
            reason: "broken pipe".into(),
        }
        .into();
        assert!(matches!(err, AgentError::ToolExecution(_)));
    }
}
