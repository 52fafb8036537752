//! Tool Catalog
//!
//! Flattens the tools of every ready worker into one ordered list,
//! namespacing each tool by its owning worker. The qualified identifier is
//! `<worker>_<tool>` and splits back at the first separator, so worker names
//! never contain the separator while tool names may.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::provider::ToolDefinition;
use crate::tool::{CallToolResult, ToolDescriptor};

/// Joins worker name and tool name in a qualified identifier
pub const TOOL_NAME_SEPARATOR: char = '_';

/// Build the qualified identifier for a worker's tool
pub fn qualify(worker: &str, tool: &str) -> String {
    format!("{worker}{TOOL_NAME_SEPARATOR}{tool}")
}

/// Split a qualified identifier into `(worker, tool)` at the first separator
pub fn split_qualified(name: &str) -> Option<(&str, &str)> {
    let (worker, tool) = name.split_once(TOOL_NAME_SEPARATOR)?;
    if worker.is_empty() || tool.is_empty() {
        return None;
    }
    Some((worker, tool))
}

/// Whether `name` can be used as a worker name
pub fn is_valid_worker_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(TOOL_NAME_SEPARATOR)
}

/// A tool together with the worker that owns it
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QualifiedTool {
    pub worker: String,
    pub tool: ToolDescriptor,
}

impl QualifiedTool {
    pub fn new(worker: impl Into<String>, tool: ToolDescriptor) -> Self {
        Self {
            worker: worker.into(),
            tool,
        }
    }

    /// Externally visible identifier
    pub fn qualified_name(&self) -> String {
        qualify(&self.worker, &self.tool.name)
    }

    /// Model-facing definition
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.qualified_name(),
            description: self.tool.description.clone(),
            input_schema: self.tool.input_schema.clone(),
        }
    }
}

/// Ordered catalog of qualified tools
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolCatalog {
    tools: Vec<QualifiedTool>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<QualifiedTool>) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &[QualifiedTool] {
        &self.tools
    }

    /// Definitions to present to the model, catalog order preserved
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(QualifiedTool::definition).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Whatever hosts the workers the agent dispatches tool calls to
#[async_trait]
pub trait ToolHost: Send + Sync {
    /// Current catalog of every ready worker's tools
    fn catalog(&self) -> ToolCatalog;

    /// Invoke `tool` on `worker` and return its decoded result
    async fn call_tool(
        &self,
        worker: &str,
        tool: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult>;
}
