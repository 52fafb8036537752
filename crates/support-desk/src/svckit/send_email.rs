//! Email Tool
//!
//! The only support tool with side effects.

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{tool::ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use crate::mailer::Mailer;
use crate::model::Email;

/// Sends an email to a customer
pub struct SendEmailTool {
    mailer: Arc<dyn Mailer>,
}

impl SendEmailTool {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl Tool for SendEmailTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "send_email".into(),
            description: "Send an email to a customer".into(),
            parameters: vec![
                ParameterSchema::required_string("to", "Recipient email address"),
                ParameterSchema::required_string("subject", "Email subject"),
                ParameterSchema::required_string("body", "Email body content"),
            ],
            has_side_effects: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let email = Email {
            to: call.str_arg("to").unwrap_or_default().to_string(),
            subject: call.str_arg("subject").unwrap_or_default().to_string(),
            body: call.str_arg("body").unwrap_or_default().to_string(),
        };

        match self.mailer.send(&email).await {
            Ok(receipt) => Ok(ToolResult::success(serde_json::to_value(receipt)?)),
            Err(e) => {
                tracing::warn!(to = %email.to, error = %e, "Email not sent");
                Ok(ToolResult::failure(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::LogMailer;

    fn call(to: &str) -> ToolCall {
        let args = serde_json::json!({
            "to": to,
            "subject": "Order ORD-002",
            "body": "Your order is on its way."
        });
        let serde_json::Value::Object(args) = args else {
            unreachable!()
        };
        ToolCall::new("send_email", args)
    }

    #[tokio::test]
    async fn test_send_email() {
        let tool = SendEmailTool::new(Arc::new(LogMailer));

        let result = tool.execute(&call("john.doe@example.com")).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output["sent"], true);
        assert_eq!(result.output["to"], "john.doe@example.com");
        assert_eq!(result.output["subject"], "Order ORD-002");
        assert!(result.output["messageId"].as_str().unwrap().starts_with("MSG-"));
    }

    #[tokio::test]
    async fn test_bad_address_is_tool_failure() {
        let tool = SendEmailTool::new(Arc::new(LogMailer));
        let result = tool.execute(&call("not-an-address")).await.unwrap();
        assert!(!result.success);
        assert!(tool.schema().has_side_effects);
    }
}
