//! Customer database worker: serves `search_customer` and
//! `get_order_details` over stdio.

use std::sync::Arc;

use support_desk::{database_tools, init_worker_tracing, MockSupportStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_worker_tracing();

    let registry = Arc::new(database_tools(Arc::new(MockSupportStore::new())));
    tracing::info!("Database worker running on stdio");

    agent_mcp::endpoint::serve_stdio(registry).await?;
    Ok(())
}
