//! Application State

use std::sync::Arc;

use agent_core::Agent;
use agent_mcp::ProcessManager;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Agent loop over the model provider and the worker-hosted tools
    pub agent: Arc<Agent>,

    /// Owner of the worker processes
    pub manager: Arc<ProcessManager>,
}
