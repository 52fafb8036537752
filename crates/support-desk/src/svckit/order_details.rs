//! Order Details Tool

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{tool::ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use crate::store::SupportStore;

/// Looks up an order by its order number
pub struct OrderDetailsTool {
    store: Arc<dyn SupportStore>,
}

impl OrderDetailsTool {
    pub fn new(store: Arc<dyn SupportStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for OrderDetailsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_order_details".into(),
            description: "Get detailed information about a specific order".into(),
            parameters: vec![ParameterSchema::required_string("orderId", "Order ID")],
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let order_id = call.str_arg("orderId").unwrap_or_default().trim();
        super::lookup_result(self.store.find_order(order_id).await)
    }
}
