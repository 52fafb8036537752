//! Customer Search Tool

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{tool::ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use crate::store::SupportStore;

/// Finds a customer record by email address
pub struct SearchCustomerTool {
    store: Arc<dyn SupportStore>,
}

impl SearchCustomerTool {
    pub fn new(store: Arc<dyn SupportStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SearchCustomerTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_customer".into(),
            description: "Search for a customer by email address".into(),
            parameters: vec![ParameterSchema::required_string("email", "Customer email address")],
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let email = call.str_arg("email").unwrap_or_default().trim();
        tracing::debug!(email, store = self.store.name(), "Searching customer");

        super::lookup_result(self.store.find_customer(email).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockSupportStore;

    fn call(email: &str) -> ToolCall {
        let mut args = serde_json::Map::new();
        args.insert("email".into(), serde_json::json!(email));
        ToolCall::new("search_customer", args)
    }

    #[tokio::test]
    async fn test_found_and_not_found() {
        let tool = SearchCustomerTool::new(Arc::new(MockSupportStore::new()));

        let result = tool.execute(&call("john.doe@example.com")).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output["id"], "CUST-12345");
        assert_eq!(result.output["tier"], "Premium");
        assert_eq!(result.output["joinDate"], "2023-06-15");

        let result = tool.execute(&call("nobody@example.com")).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, serde_json::json!({"error": "Customer not found"}));
    }

    #[test]
    fn test_requires_email() {
        let tool = SearchCustomerTool::new(Arc::new(MockSupportStore::new()));
        let empty = ToolCall::new("search_customer", serde_json::Map::new());
        assert!(tool.validate(&empty).is_err());
        assert_eq!(tool.schema().descriptor().input_schema["required"], serde_json::json!(["email"]));
    }
}
