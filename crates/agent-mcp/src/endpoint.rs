//! Worker-side endpoint.
//!
//! Serves a `ToolRegistry` over line-delimited JSON-RPC, answering requests
//! strictly in arrival order. Worker binaries call [`serve_stdio`].

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use agent_core::{AgentError, CallToolResult, ToolCall, ToolRegistry, ToolResult};

use crate::protocol::{
    self, CallToolParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    CALL_TOOL, LIST_TOOLS,
};

/// Answer requests read from `reader` until it reaches EOF
pub async fn serve<R, W>(registry: Arc<ToolRegistry>, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    tracing::info!(tools = ?registry.names(), "Serving tools");

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(response) = handle_line(&registry, &line).await else {
            continue;
        };

        let encoded = protocol::encode_line(&response).map_err(std::io::Error::other)?;
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }

    tracing::info!("Input closed, endpoint stopping");
    Ok(())
}

/// Serve on the process's standard streams
pub async fn serve_stdio(registry: Arc<ToolRegistry>) -> std::io::Result<()> {
    serve(registry, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Response for one input line; `None` for blank lines and notifications
async fn handle_line(registry: &ToolRegistry, line: &str) -> Option<JsonRpcResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Unparsable request");
            return Some(JsonRpcResponse::failure(Value::Null, JsonRpcError::parse_error(e)));
        }
    };

    let Some(id) = request.id.clone() else {
        tracing::debug!(method = %request.method, "Ignoring notification");
        return None;
    };

    Some(match dispatch(registry, &request).await {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(err) => JsonRpcResponse::failure(id, err),
    })
}

async fn dispatch(registry: &ToolRegistry, request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
    match request.method.as_str() {
        LIST_TOOLS => to_value(&ListToolsResult {
            tools: registry.descriptors(),
        }),
        CALL_TOOL => {
            let params: CallToolParams = serde_json::from_value(request.params.clone())
                .map_err(JsonRpcError::invalid_params)?;
            let result = call(registry, params).await?;
            to_value(&result)
        }
        other => Err(JsonRpcError::method_not_found(other)),
    }
}

async fn call(registry: &ToolRegistry, params: CallToolParams) -> Result<CallToolResult, JsonRpcError> {
    let arguments = match params.arguments {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(JsonRpcError::invalid_params(format!(
                "arguments must be an object, got {other}"
            )));
        }
    };

    let call = ToolCall::new(params.name, arguments);
    tracing::debug!(tool = %call.name, "Executing tool");

    match registry.execute(&call).await {
        Ok(result) => Ok(result.into()),
        Err(AgentError::InvalidToolName(name)) => {
            Err(JsonRpcError::invalid_params(format!("Unknown tool: {name}")))
        }
        Err(AgentError::ToolValidation(reason)) => Err(JsonRpcError::invalid_params(reason)),
        Err(e) => {
            tracing::warn!(tool = %call.name, error = %e, "Tool failed");
            Ok(ToolResult::failure(e.to_string()).into())
        }
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(JsonRpcError::internal)
}
