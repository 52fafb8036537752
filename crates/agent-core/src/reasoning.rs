//! Reasoning Loop
//!
//! Drives the model/tool exchange: the model is invoked with the aggregated
//! tool catalog, every tool-use request is dispatched to the owning worker
//! and its result fed back, and the loop ends when the model answers in
//! plain text.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{split_qualified, ToolHost};
use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message, Role};
use crate::provider::{GenerationOptions, LlmProvider, ModelRequest, ModelResponse, ToolDefinition};

/// Returned when the final response carries no text
pub const FALLBACK_MESSAGE: &str =
    "I apologize, but I encountered an issue processing your request.";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the available tools when they help answer the user, then answer concisely.";

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System instruction sent with every model invocation
    pub system_prompt: String,

    /// Maximum tool-use rounds per run before giving up
    pub max_tool_rounds: usize,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_tool_rounds: 10,
            generation: GenerationOptions::default(),
        }
    }
}

/// One tool invocation within a run
#[derive(Clone, Debug, Serialize)]
pub struct ToolActivityRecord {
    /// Worker that owns the tool
    pub server: String,
    pub tool: String,
    pub input: serde_json::Value,
    pub timestamp: DateTime<Utc>,

    /// Parsed result payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    /// Set when the worker flagged the result as a tool error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one `converse` run
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReply {
    /// Final assistant text
    pub message: String,

    pub tool_activity: Vec<ToolActivityRecord>,

    /// Prior history + the new user turn + the new assistant turn
    pub conversation_history: Conversation,
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<dyn ToolHost>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<dyn ToolHost>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Answer `user_message` in the context of `history`
    ///
    /// `history` is never modified; the extended conversation is part of
    /// the reply. Any model or tool failure aborts the run.
    pub async fn converse(&self, user_message: &str, history: &Conversation) -> Result<AgentReply> {
        let mut messages = history.messages().to_vec();
        messages.push(Message::user(user_message));

        let tools = self.tools.catalog().definitions();
        let mut tool_activity = Vec::new();
        let mut rounds = 0;

        let mut response = self.invoke(&messages, &tools).await?;

        while response.wants_tool() {
            let Some((tool_use_id, name, input)) = response.first_tool_use() else {
                tracing::warn!("tool_use stop without a tool_use block, treating as final");
                break;
            };

            rounds += 1;
            if rounds > self.config.max_tool_rounds {
                return Err(AgentError::ToolLoopExceeded(self.config.max_tool_rounds));
            }

            let (worker, tool) =
                split_qualified(name).ok_or_else(|| AgentError::InvalidToolName(name.to_string()))?;

            let mut record = ToolActivityRecord {
                server: worker.to_string(),
                tool: tool.to_string(),
                input: input.clone(),
                timestamp: Utc::now(),
                result: None,
                error: None,
            };

            tracing::info!(worker, tool, round = rounds, "Calling tool");

            let result = self.tools.call_tool(worker, tool, input.clone()).await?;
            let text = result
                .first_text()
                .ok_or_else(|| AgentError::MalformedResponse {
                    worker: worker.to_string(),
                    reason: "tool result has no text content".into(),
                })?
                .to_string();

            record.result = Some(serde_json::from_str(&text)?);
            if result.is_error {
                record.error = Some(text.clone());
            }
            tool_activity.push(record);

            messages.push(Message::blocks(Role::Assistant, response.content.clone()));
            messages.push(Message::tool_result(tool_use_id, text));

            response = self.invoke(&messages, &tools).await?;
        }

        let message = response
            .text_content()
            .unwrap_or(FALLBACK_MESSAGE)
            .to_string();

        let mut conversation_history = history.clone();
        conversation_history.push(Message::user(user_message));
        conversation_history.push(Message::assistant(message.clone()));

        Ok(AgentReply {
            message,
            tool_activity,
            conversation_history,
        })
    }

    async fn invoke(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<ModelResponse> {
        let request = ModelRequest {
            system: self.config.system_prompt.clone(),
            tools: tools.to_vec(),
            messages: messages.to_vec(),
            options: self.config.generation.clone(),
        };

        let response = self.provider.complete(&request).await?;
        tracing::debug!(
            provider = self.provider.name(),
            stop_reason = ?response.stop_reason,
            blocks = response.content.len(),
            "Model responded"
        );
        Ok(response)
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
#[derive(Default)]
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: Option<Arc<dyn ToolHost>>,
    config: AgentConfig,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tools(mut self, tools: Arc<dyn ToolHost>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.generation.max_tokens = max_tokens;
        self
    }

    pub fn max_tool_rounds(mut self, max: usize) -> Self {
        self.config.max_tool_rounds = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        let tools = self
            .tools
            .ok_or_else(|| AgentError::Config("Tool host is required".into()))?;

        Ok(Agent::new(provider, tools, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{QualifiedTool, ToolCatalog};
    use crate::message::{ContentBlock, MessageContent};
    use crate::tool::{CallToolResult, ToolContent, ToolDescriptor};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed list of responses and records every request
    struct ScriptedProvider {
        responses: Mutex<VecDeque<ModelResponse>>,
        requests: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<ModelResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<ModelRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AgentError::Provider("script exhausted".into()))
        }
    }

    /// Serves canned JSON text per qualified tool and records calls
    struct FakeHost {
        catalog: ToolCatalog,
        calls: Mutex<Vec<(String, String, serde_json::Value)>>,
    }

    impl FakeHost {
        fn new() -> Arc<Self> {
            let tool = |name: &str| ToolDescriptor {
                name: name.into(),
                description: format!("{name} tool"),
                input_schema: serde_json::json!({"type": "object"}),
            };
            Arc::new(Self {
                catalog: ToolCatalog::new(vec![
                    QualifiedTool::new("database", tool("search_customer")),
                    QualifiedTool::new("email", tool("send_email")),
                ]),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ToolHost for FakeHost {
        fn catalog(&self) -> ToolCatalog {
            self.catalog.clone()
        }

        async fn call_tool(
            &self,
            worker: &str,
            tool: &str,
            arguments: serde_json::Value,
        ) -> Result<CallToolResult> {
            self.calls
                .lock()
                .unwrap()
                .push((worker.into(), tool.into(), arguments));

            let text = match (worker, tool) {
                ("database", "search_customer") => r#"{"id":"CUST-12345","name":"John Doe"}"#,
                ("email", "send_email") => r#"{"sent":true,"messageId":"MSG-1"}"#,
                ("database", "broken") => "not json",
                _ => return Err(AgentError::WorkerNotReady(worker.into())),
            };
            Ok(CallToolResult {
                content: vec![ToolContent::Text { text: text.into() }],
                is_error: false,
            })
        }
    }

    fn agent(provider: Arc<ScriptedProvider>, host: Arc<FakeHost>) -> Agent {
        AgentBuilder::new()
            .provider(provider)
            .tools(host)
            .system_prompt("You are a support agent.")
            .max_tool_rounds(3)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_two_tool_rounds_then_answer() {
        let provider = ScriptedProvider::new(vec![
            ModelResponse::tool_use(
                "toolu_1",
                "database_search_customer",
                serde_json::json!({"email": "john.doe@example.com"}),
            ),
            ModelResponse::tool_use(
                "toolu_2",
                "email_send_email",
                serde_json::json!({"to": "john.doe@example.com", "subject": "Order", "body": "Shipped"}),
            ),
            ModelResponse::text("Your order has shipped."),
        ]);
        let host = FakeHost::new();
        let agent = agent(provider.clone(), host.clone());

        let reply = agent.converse("Where is my order?", &Conversation::new()).await.unwrap();

        assert_eq!(reply.message, "Your order has shipped.");
        assert_eq!(reply.tool_activity.len(), 2);
        assert_eq!(reply.tool_activity[0].server, "database");
        assert_eq!(reply.tool_activity[0].tool, "search_customer");
        assert_eq!(
            reply.tool_activity[0].result,
            Some(serde_json::json!({"id": "CUST-12345", "name": "John Doe"}))
        );
        assert_eq!(reply.tool_activity[1].server, "email");
        assert_eq!(reply.tool_activity[1].tool, "send_email");

        let calls = host.calls.lock().unwrap().clone();
        assert_eq!(calls[0].2, serde_json::json!({"email": "john.doe@example.com"}));

        let requests = provider.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.system == "You are a support agent."));
        assert!(requests.iter().all(|r| r.tools.len() == 2));
        assert_eq!(requests[0].tools[0].name, "database_search_customer");

        // user, assistant tool_use, user tool_result, assistant tool_use, user tool_result
        let last = &requests[2].messages;
        assert_eq!(last.len(), 5);
        assert_eq!(
            last[2].content,
            MessageContent::Blocks(vec![ContentBlock::tool_result(
                "toolu_1",
                r#"{"id":"CUST-12345","name":"John Doe"}"#
            )])
        );
    }

    #[tokio::test]
    async fn test_history_extended_not_mutated() {
        let provider = ScriptedProvider::new(vec![ModelResponse::text("Hello again!")]);
        let agent = agent(provider, FakeHost::new());

        let history = Conversation::from(vec![Message::user("Hi"), Message::assistant("Hello!")]);
        let reply = agent.converse("Still there?", &history).await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(reply.conversation_history.len(), 4);
        assert_eq!(reply.conversation_history.messages()[2], Message::user("Still there?"));
        assert_eq!(reply.conversation_history.messages()[3], Message::assistant("Hello again!"));
        assert!(reply.tool_activity.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_when_no_text() {
        let provider = ScriptedProvider::new(vec![ModelResponse {
            content: vec![],
            stop_reason: crate::provider::StopReason::EndTurn,
            model: String::new(),
            usage: None,
        }]);
        let agent = agent(provider, FakeHost::new());

        let reply = agent.converse("Hi", &Conversation::new()).await.unwrap();
        assert_eq!(reply.message, FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_round_limit() {
        let call = || {
            ModelResponse::tool_use(
                "toolu",
                "database_search_customer",
                serde_json::json!({"email": "john.doe@example.com"}),
            )
        };
        let provider = ScriptedProvider::new(vec![call(), call(), call(), call(), call()]);
        let agent = agent(provider, FakeHost::new());

        let err = agent.converse("loop", &Conversation::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolLoopExceeded(3)));
    }

    #[tokio::test]
    async fn test_unsplittable_tool_name() {
        let provider = ScriptedProvider::new(vec![ModelResponse::tool_use(
            "toolu",
            "search",
            serde_json::json!({}),
        )]);
        let agent = agent(provider, FakeHost::new());

        let err = agent.converse("find me", &Conversation::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidToolName(name) if name == "search"));
    }

    #[tokio::test]
    async fn test_tool_failure_aborts_run() {
        let provider = ScriptedProvider::new(vec![
            ModelResponse::tool_use("toolu", "billing_refund", serde_json::json!({})),
            ModelResponse::text("unreachable"),
        ]);
        let agent = agent(provider, FakeHost::new());

        let err = agent.converse("refund", &Conversation::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::WorkerNotReady(name) if name == "billing"));
    }

    #[tokio::test]
    async fn test_unparsable_result_is_fatal() {
        let provider = ScriptedProvider::new(vec![
            ModelResponse::tool_use("toolu", "database_broken", serde_json::json!({})),
            ModelResponse::text("unreachable"),
        ]);
        let agent = agent(provider, FakeHost::new());

        let err = agent.converse("break", &Conversation::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::Json(_)));
    }
}
