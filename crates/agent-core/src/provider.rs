//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for model backends that support native tool
//! use. The agent loop works exclusively through this interface.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{LlmProvider, ModelRequest};
//!
//! let provider = AnthropicProvider::from_env()?;
//! let response = provider.complete(&request).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{ContentBlock, Message};

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier
    pub model: String,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature; provider default when unset
    #[serde(default)]
    pub temperature: Option<f32>,
}

const fn default_max_tokens() -> u32 {
    4096
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".into(),
            max_tokens: default_max_tokens(),
            temperature: None,
        }
    }
}

/// A tool as declared to the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Qualified `<worker>_<tool>` identifier
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// One model invocation
#[derive(Clone, Debug)]
pub struct ModelRequest {
    /// System instruction, reissued verbatim every round
    pub system: String,
    pub tools: Vec<ToolDefinition>,
    pub messages: Vec<Message>,
    pub options: GenerationOptions,
}

/// Why the model stopped
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    #[serde(other)]
    Other,
}

/// Token usage statistics
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Content blocks in the order the model produced them
    pub content: Vec<ContentBlock>,

    pub stop_reason: StopReason,

    /// Model that generated this response
    #[serde(default)]
    pub model: String,

    /// Token usage statistics (if available)
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl ModelResponse {
    /// A final answer consisting of one text block
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            stop_reason: StopReason::EndTurn,
            model: String::new(),
            usage: None,
        }
    }

    /// A tool-use request with a single `tool_use` block
    pub fn tool_use(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        Self {
            content: vec![ContentBlock::tool_use(id, name, input)],
            stop_reason: StopReason::ToolUse,
            model: String::new(),
            usage: None,
        }
    }

    /// Whether the model signals tool-use intent
    pub fn wants_tool(&self) -> bool {
        self.stop_reason == StopReason::ToolUse
    }

    /// The first `tool_use` block as `(id, name, input)`
    pub fn first_tool_use(&self) -> Option<(&str, &str, &serde_json::Value)> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => Some((id.as_str(), name.as_str(), input)),
            _ => None,
        })
    }

    /// Text of the first text block; later text blocks are ignored
    pub fn text_content(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Check if the provider is available and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Run one model invocation
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert_eq!(opts.max_tokens, 4096);
        assert_eq!(opts.model, "claude-sonnet-4-20250514");
        assert!(opts.temperature.is_none());
    }

    #[test]
    fn test_first_tool_use_ignores_later_blocks() {
        let response = ModelResponse {
            content: vec![
                ContentBlock::text("Checking."),
                ContentBlock::tool_use("a", "database_search_customer", serde_json::json!({})),
                ContentBlock::tool_use("b", "email_send_email", serde_json::json!({})),
            ],
            stop_reason: StopReason::ToolUse,
            model: String::new(),
            usage: None,
        };

        let (id, name, _) = response.first_tool_use().unwrap();
        assert_eq!(id, "a");
        assert_eq!(name, "database_search_customer");
        assert_eq!(response.text_content(), Some("Checking."));
    }

    #[test]
    fn test_text_content_takes_first_block() {
        let response = ModelResponse {
            content: vec![
                ContentBlock::tool_use("a", "database_search_customer", serde_json::json!({})),
                ContentBlock::text("Found it."),
                ContentBlock::text(" Anything else?"),
            ],
            stop_reason: StopReason::EndTurn,
            model: String::new(),
            usage: None,
        };
        assert_eq!(response.text_content(), Some("Found it."));

        let empty = ModelResponse {
            content: vec![],
            stop_reason: StopReason::EndTurn,
            model: String::new(),
            usage: None,
        };
        assert_eq!(empty.text_content(), None);
    }

    #[test]
    fn test_unknown_stop_reason() {
        let reason: StopReason = serde_json::from_str(r#""pause_turn""#).unwrap();
        assert_eq!(reason, StopReason::Other);
    }
}
