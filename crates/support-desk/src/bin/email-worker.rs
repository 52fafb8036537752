//! Email worker: serves `send_email` over stdio.

use std::sync::Arc;

use support_desk::{email_tools, init_worker_tracing, LogMailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_worker_tracing();

    let registry = Arc::new(email_tools(Arc::new(LogMailer)));
    tracing::info!("Email worker running on stdio");

    agent_mcp::endpoint::serve_stdio(registry).await?;
    Ok(())
}
