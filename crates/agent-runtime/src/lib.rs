//! # agent-runtime
//!
//! Runtime providers for the support agent.
//!
//! ## Providers
//!
//! - **Anthropic**: Claude models through the Messages API, with native tool use
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::AnthropicProvider;
//!
//! let provider = AnthropicProvider::from_env()?;
//! let agent = AgentBuilder::default()
//!     .provider(Arc::new(provider))
//!     .tools(manager)
//!     .build()?;
//! ```

pub mod anthropic;

pub use anthropic::{AnthropicConfig, AnthropicProvider};

// Re-export core types for convenience
pub use agent_core::{Agent, AgentError, LlmProvider, Message, Result, Role};
