//! Support agent HTTP server
//!
//! Starts the worker processes, then serves the chat and health endpoints
//! plus the static frontend. Workers are stopped on shutdown.

mod config;
mod handlers;
mod state;

use std::path::Path;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentBuilder, LlmProvider, ToolHost};
use agent_mcp::{ManagerConfig, ProcessManager};
use agent_runtime::AnthropicProvider;
use support_desk::SUPPORT_AGENT_PROMPT;

use crate::config::ServerConfig;
use crate::handlers::{chat_handler, health_check};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Initialize LLM provider
    let provider = Arc::new(AnthropicProvider::from_env()?);
    tracing::info!(
        provider = provider.name(),
        model = %provider.config().model,
        "Model provider configured"
    );

    // Start workers in order; any failure is fatal
    let manager = Arc::new(ProcessManager::new(ManagerConfig::from_env()));
    for worker in &config.workers {
        if let Err(e) = manager.start_worker(&worker.name, &worker.launch).await {
            tracing::error!(worker = %worker.name, error = %e, "Failed to start worker");
            manager.shutdown().await;
            return Err(e.into());
        }
    }

    tracing::info!("Available tools:");
    for tool in manager.get_all_tools() {
        tracing::info!("  • {}", tool.qualified_name());
    }

    let host: Arc<dyn ToolHost> = manager.clone();
    let agent = AgentBuilder::default()
        .provider(provider.clone())
        .tools(host)
        .system_prompt(SUPPORT_AGENT_PROMPT)
        .model(provider.config().model.clone())
        .max_tokens(config.max_tokens)
        .max_tool_rounds(config.max_tool_rounds)
        .build()?;

    let state = AppState {
        agent: Arc::new(agent),
        manager: Arc::clone(&manager),
    };
    let app = router(state, &config.static_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 Support agent running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  POST /api/chat   - Send message");
    tracing::info!("  GET  /api/health - Worker status");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    manager.shutdown().await;
    served?;

    Ok(())
}

/// API routes, with static files for everything else
pub(crate) fn router(state: AppState, static_dir: &Path) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_handler))
        .route("/chat", post(chat_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
