//! # support-desk
//!
//! Customer-support capabilities for the agent: a customer/order store, an
//! outgoing mailer, and the tools built on them.
//!
//! Each capability family runs as its own worker process:
//!
//! ```text
//! database-worker  ── search_customer, get_order_details
//! email-worker     ── send_email
//! ```
//!
//! Workers speak JSON-RPC on stdout, so their logs go to stderr, where the
//! process manager picks them up.

pub mod error;
pub mod mailer;
pub mod model;
pub mod store;
pub mod svckit;

use std::sync::Arc;

use agent_core::ToolRegistry;

pub use error::{Result, SupportError};
pub use mailer::{LogMailer, Mailer};
pub use model::{Customer, CustomerTier, Email, EmailReceipt, Order, OrderStatus, OrderSummary};
pub use store::{MockSupportStore, SupportStore};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{OrderDetailsTool, SearchCustomerTool, SendEmailTool};
}

/// Worker name of the customer database
pub const DATABASE_WORKER: &str = "database";

/// Worker name of the mailer
pub const EMAIL_WORKER: &str = "email";

/// Tools served by the database worker
pub fn database_tools(store: Arc<dyn SupportStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(tools::SearchCustomerTool::new(Arc::clone(&store)));
    registry.register(tools::OrderDetailsTool::new(store));
    registry
}

/// Tools served by the email worker
pub fn email_tools(mailer: Arc<dyn Mailer>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(tools::SendEmailTool::new(mailer));
    registry
}

/// Log to stderr; stdout belongs to the protocol
pub fn init_worker_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

/// System prompt for the support agent
pub const SUPPORT_AGENT_PROMPT: &str = r"You are a helpful customer support agent. You have access to customer database and email systems through MCP tools.

When helping customers:
1. Search for their information using search_customer
2. Get order details if they ask about orders
3. Send confirmation emails when appropriate
4. Be friendly and professional

Available tools:
- database_search_customer: Search for customer by email
- database_get_order_details: Get order information
- email_send_email: Send emails to customers";
