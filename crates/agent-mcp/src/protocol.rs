//! Worker Protocol
//!
//! JSON-RPC 2.0 messages exchanged with workers over their standard
//! streams, one JSON document per line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use agent_core::ToolDescriptor;

pub const JSONRPC_VERSION: &str = "2.0";

/// Request id of the startup `tools/list` exchange
pub const HANDSHAKE_ID: u64 = 1;

pub const LIST_TOOLS: &str = "tools/list";
pub const CALL_TOOL: &str = "tools/call";

// Standard JSON-RPC error codes
pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,

    /// Absent for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    pub method: String,

    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: Some(Value::from(id)),
            method: method.into(),
            params,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(reason: impl std::fmt::Display) -> Self {
        Self::new(PARSE_ERROR, format!("Parse error: {reason}"))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    pub fn invalid_params(reason: impl std::fmt::Display) -> Self {
        Self::new(INVALID_PARAMS, format!("Invalid params: {reason}"))
    }

    pub fn internal(reason: impl std::fmt::Display) -> Self {
        Self::new(INTERNAL_ERROR, format!("Internal error: {reason}"))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// `result` of `tools/list`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<ToolDescriptor>,
}

/// `params` of `tools/call`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Serialize a message as one protocol line, newline included
pub fn encode_line<T: Serialize>(message: &T) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Decode the tool list out of a handshake response line
pub fn parse_list_tools(line: &str) -> Result<Vec<ToolDescriptor>, String> {
    let response: JsonRpcResponse =
        serde_json::from_str(line).map_err(|e| format!("not a JSON-RPC response: {e}"))?;

    if let Some(err) = response.error {
        return Err(format!("tools/list failed [{}]: {}", err.code, err.message));
    }

    let result = response
        .result
        .ok_or_else(|| "response has no result".to_string())?;
    let listed: ListToolsResult =
        serde_json::from_value(result).map_err(|e| format!("result.tools is not a tool list: {e}"))?;

    for (idx, tool) in listed.tools.iter().enumerate() {
        if listed.tools[..idx].iter().any(|t| t.name == tool.name) {
            return Err(format!("duplicate tool name '{}'", tool.name));
        }
    }

    Ok(listed.tools)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_line_shape() {
        let request = JsonRpcRequest::new(HANDSHAKE_ID, LIST_TOOLS, serde_json::json!({}));
        let line = encode_line(&request).unwrap();
        assert_eq!(line, "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\",\"params\":{}}\n");
    }

    #[test]
    fn test_parse_list_tools() {
        let line = r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[
            {"name":"search_customer","description":"Search","inputSchema":{"type":"object"}},
            {"name":"get_order_details","description":"Order","inputSchema":{"type":"object"}}
        ]}}"#;
        let tools = parse_list_tools(line).unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[1].name, "get_order_details");
    }

    #[test]
    fn test_parse_list_tools_rejects_bad_shapes() {
        assert!(parse_list_tools("Database server running").is_err());
        assert!(parse_list_tools(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#).is_err());
        assert!(parse_list_tools(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#
        )
        .is_err());

        let dup = r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[{"name":"a"},{"name":"a"}]}}"#;
        assert_eq!(parse_list_tools(dup).unwrap_err(), "duplicate tool name 'a'");
    }

    #[test]
    fn test_notification_has_no_id() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(request.id.is_none());
        assert_eq!(request.params, Value::Null);
    }
}
