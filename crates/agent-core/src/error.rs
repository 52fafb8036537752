//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The worker is unknown or has not completed its handshake
    #[error("Worker {0} not ready")]
    WorkerNotReady(String),

    /// No response to a tool call within the call deadline
    #[error("Tool call {worker}:{tool} timed out after {timeout_ms}ms")]
    ToolTimeout {
        worker: String,
        tool: String,
        timeout_ms: u64,
    },

    /// A worker answered with something that is not a usable response
    #[error("Malformed response from worker {worker}: {reason}")]
    MalformedResponse { worker: String, reason: String },

    /// A worker answered with a JSON-RPC error object
    #[error("Worker {worker} returned error [{code}]: {message}")]
    ToolServer {
        worker: String,
        code: i64,
        message: String,
    },

    /// The worker process went away while a call was outstanding
    #[error("Worker {0} exited")]
    WorkerExited(String),

    /// The model asked for a tool name that is not `<worker>_<tool>`
    #[error("Invalid tool name: {0}")]
    InvalidToolName(String),

    /// Tool validation failed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// The model kept requesting tools past the configured round limit
    #[error("Tool loop exceeded {0} rounds")]
    ToolLoopExceeded(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_errors_name_worker_and_tool() {
        let err = AgentError::ToolTimeout {
            worker: "database".into(),
            tool: "search_customer".into(),
            timeout_ms: 10_000,
        };
        assert_eq!(err.to_string(), "Tool call database:search_customer timed out after 10000ms");

        let err = AgentError::ToolServer {
            worker: "email".into(),
            code: -32602,
            message: "Unknown tool: send_fax".into(),
        };
        assert_eq!(err.to_string(), "Worker email returned error [-32602]: Unknown tool: send_fax");
    }
}
