//! Anthropic LLM Provider
//!
//! Implementation of `LlmProvider` over the Messages API with native tool use.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{ContentBlock, Message},
    provider::{LlmProvider, ModelRequest, ModelResponse, StopReason, TokenUsage, ToolDefinition},
};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const API_VERSION: &str = "2023-06-01";

/// Anthropic provider configuration
#[derive(Clone)]
pub struct AnthropicConfig {
    pub api_key: String,

    /// Default model when a request does not name one
    pub model: String,

    /// API root, without the `/v1/messages` path
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "claude-sonnet-4-20250514".into(),
            base_url: "https://api.anthropic.com".into(),
            timeout_secs: 120,
        }
    }
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AnthropicConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Config("ANTHROPIC_API_KEY is not set".into()))?;

        let defaults = Self::default();
        Ok(Self {
            api_key,
            model: std::env::var("ANTHROPIC_MODEL").unwrap_or(defaults.model),
            base_url: std::env::var("ANTHROPIC_BASE_URL").unwrap_or(defaults.base_url),
            timeout_secs: std::env::var("ANTHROPIC_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "is_blank")]
    system: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

fn is_blank(system: &&str) -> bool {
    system.is_empty()
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<Value>,
    #[serde(default)]
    stop_reason: Option<StopReason>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    /// Create from configuration
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let key = header::HeaderValue::from_str(&config.api_key)
            .map_err(|e| AgentError::Config(format!("Invalid API key format: {e}")))?;
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", header::HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(AnthropicConfig::from_env()?)
    }

    pub const fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn build_request<'a>(&'a self, request: &'a ModelRequest) -> MessagesRequest<'a> {
        let model = if request.options.model.is_empty() {
            self.config.model.as_str()
        } else {
            request.options.model.as_str()
        };

        MessagesRequest {
            model,
            max_tokens: request.options.max_tokens,
            system: &request.system,
            messages: &request.messages,
            tools: &request.tools,
            temperature: request.options.temperature,
        }
    }
}

/// Decode a Messages API body, skipping content blocks the loop does not use
fn decode_response(body: MessagesResponse) -> ModelResponse {
    let content = body
        .content
        .into_iter()
        .filter_map(|block| match serde_json::from_value::<ContentBlock>(block) {
            Ok(block) => Some(block),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unsupported content block");
                None
            }
        })
        .collect();

    ModelResponse {
        content,
        stop_reason: body.stop_reason.unwrap_or(StopReason::EndTurn),
        model: body.model,
        usage: body.usage,
    }
}

/// Map a non-success status and its body onto the error taxonomy
fn status_error(status: StatusCode, body: &str) -> AgentError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    let detail = format!("HTTP {status}: {detail}");

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
        s if s.is_server_error() => AgentError::ProviderUnavailable(detail),
        _ => AgentError::Provider(detail),
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.config.api_key.is_empty())
    }

    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let body = self.build_request(request);
        tracing::debug!(
            model = body.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "Sending Messages API request"
        );

        let response = self
            .client
            .post(self.config.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Messages API returned an error");
            return Err(status_error(status, &text));
        }

        let decoded: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Failed to decode response: {e}")))?;

        let response = decode_response(decoded);
        tracing::debug!(stop_reason = ?response.stop_reason, blocks = response.content.len(), "Model responded");
        Ok(response)
    }
}
