//! HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize, Serializer};

use agent_core::{message::Conversation, reasoning::AgentReply};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conversation_history: Conversation,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerHealth {
    pub ready: bool,
    pub tool_count: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Keyed by worker name, in start order
    #[serde(serialize_with = "ordered_map")]
    pub servers: Vec<(String, WorkerHealth)>,
}

fn ordered_map<S: Serializer>(entries: &[(String, WorkerHealth)], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(entries.iter().map(|(name, health)| (name, health)))
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Handlers
// ============================================================================

/// Worker readiness
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let servers = state
        .manager
        .health()
        .into_iter()
        .map(|w| {
            (
                w.name,
                WorkerHealth {
                    ready: w.ready,
                    tool_count: w.tool_count,
                },
            )
        })
        .collect();

    Json(HealthResponse {
        status: "ok",
        servers,
    })
}

/// Run one agent turn
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<AgentReply>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Message is required".into(),
                details: None,
            }),
        ));
    }

    tracing::info!(history = payload.conversation_history.len(), "Chat request");

    let reply = state
        .agent
        .converse(&payload.message, &payload.conversation_history)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Agent run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to process message".into(),
                    details: Some(e.to_string()),
                }),
            )
        })?;

    tracing::info!(tools = reply.tool_activity.len(), "Chat answered");
    Ok(Json(reply))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use agent_core::{
        provider::ModelRequest, AgentBuilder, AgentError, LlmProvider, ModelResponse, ToolHost,
    };
    use agent_mcp::ProcessManager;

    use super::*;

    struct ScriptedProvider(Mutex<VecDeque<agent_core::Result<ModelResponse>>>);

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> agent_core::Result<bool> {
            Ok(true)
        }

        async fn complete(&self, _request: &ModelRequest) -> agent_core::Result<ModelResponse> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgentError::Provider("script exhausted".into())))
        }
    }

    fn app(script: Vec<agent_core::Result<ModelResponse>>) -> axum::Router {
        let manager = Arc::new(ProcessManager::default());
        let host: Arc<dyn ToolHost> = manager.clone();
        let agent = AgentBuilder::default()
            .provider(Arc::new(ScriptedProvider(Mutex::new(script.into()))))
            .tools(host)
            .build()
            .unwrap();

        crate::router(
            AppState {
                agent: Arc::new(agent),
                manager,
            },
            std::path::Path::new("public"),
        )
    }

    async fn post_chat(app: axum::Router, body: Value) -> (StatusCode, Value) {
        let request = Request::post("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_chat_returns_reply_and_history() {
        let app = app(vec![Ok(ModelResponse::text("Happy to help!"))]);
        let (status, body) = post_chat(
            app,
            json!({
                "message": "Hello",
                "conversationHistory": [
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello! How can I help?"}
                ]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Happy to help!");
        assert_eq!(body["toolActivity"], json!([]));
        assert_eq!(body["conversationHistory"].as_array().unwrap().len(), 4);
        assert_eq!(body["conversationHistory"][3]["content"], "Happy to help!");
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (status, body) = post_chat(app(vec![]), json!({"message": ""})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Message is required"}));

        let (status, _) = post_chat(app(vec![]), json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_run_failure_is_500_with_details() {
        let app = app(vec![Err(AgentError::RateLimited("slow down".into()))]);
        let (status, body) = post_chat(app, json!({"message": "Hello"})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to process message");
        assert!(body["details"].as_str().unwrap().contains("slow down"));
    }

    #[tokio::test]
    async fn test_unknown_worker_tool_fails_run() {
        let app = app(vec![Ok(ModelResponse::tool_use(
            "tu_1",
            "database_search_customer",
            json!({"email": "john.doe@example.com"}),
        ))]);
        let (status, body) = post_chat(app, json!({"message": "Find me"})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["details"].as_str().unwrap().contains("not ready"));
    }

    #[tokio::test]
    async fn test_health_aliases() {
        for path in ["/api/health", "/health"] {
            let response = app(vec![])
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body, json!({"status": "ok", "servers": {}}));
        }
    }

    #[test]
    fn test_health_keeps_start_order() {
        let health = HealthResponse {
            status: "ok",
            servers: vec![
                ("email".into(), WorkerHealth { ready: true, tool_count: 1 }),
                ("database".into(), WorkerHealth { ready: false, tool_count: 0 }),
            ],
        };

        assert_eq!(
            serde_json::to_string(&health).unwrap(),
            r#"{"status":"ok","servers":{"email":{"ready":true,"toolCount":1},"database":{"ready":false,"toolCount":0}}}"#
        );
    }
}
