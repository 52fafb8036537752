//! # agent-core
//!
//! Core agent logic: a provider-agnostic tool-use loop over tools hosted by
//! external workers.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Agent                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Reasoning  │  │  ToolHost   │  │   LlmProvider       │  │
//! │  │    Loop     │──│  (catalog)  │──│   (Strategy)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ToolHost` trait is implemented by the process manager in
//! `agent-mcp`; `LlmProvider` by the backends in `agent-runtime`.

pub mod catalog;
pub mod error;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod tool;

pub use catalog::{QualifiedTool, ToolCatalog, ToolHost};
pub use error::{AgentError, Result};
pub use message::{ContentBlock, Conversation, Message, Role};
pub use provider::{LlmProvider, ModelRequest, ModelResponse, StopReason};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, AgentReply, ToolActivityRecord};
pub use tool::{
    CallToolResult, Tool, ToolCall, ToolDescriptor, ToolRegistry, ToolResult, ToolSchema,
};
