//! Service Kit - Agent Tools
//!
//! Support tools that implement `agent_core::Tool`; the worker binaries
//! serve them.

mod order_details;
mod search_customer;
mod send_email;

pub use order_details::OrderDetailsTool;
pub use search_customer::SearchCustomerTool;
pub use send_email::SendEmailTool;

use agent_core::{Result as CoreResult, ToolResult};
use serde::Serialize;

/// Turn a store lookup into a tool result
///
/// Misses become a successful result carrying `{"error": "..."}` so the
/// model can tell the customer; anything else is a tool failure.
fn lookup_result<T: Serialize>(outcome: crate::error::Result<T>) -> CoreResult<ToolResult> {
    match outcome {
        Ok(record) => Ok(ToolResult::success(serde_json::to_value(record)?)),
        Err(e) if e.is_not_found() => Ok(ToolResult::success(
            serde_json::json!({ "error": e.to_string() }),
        )),
        Err(e) => Err(e.into()),
    }
}

