//! Tool registry and the bridge to the MCP server's handler trait.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::mcp::protocol::{CallToolParams, CallToolResult, Tool, ToolContent};
use crate::mcp::server::{McpServer, ToolHandler};
use crate::tools::basic::{CalculatorTool, EchoTool, TextAnalyzerTool};
use crate::tools::data_processor::DataProcessorTool;
use crate::tools::file_manager::FileManagerTool;
use crate::tools::web_api::WebApiTool;
use crate::tools::{McpTool, ToolDescriptor, ToolError, ToolResult};

/// Immutable name to tool mapping, built once at startup.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn McpTool>>,
}

impl ToolRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the echo, calculator and text analyzer tools.
    #[inline]
    pub fn basic() -> Result<Self, ToolError> {
        let mut registry = Self::new();
        registry.register(EchoTool::new()?)?;
        registry.register(CalculatorTool::new()?)?;
        registry.register(TextAnalyzerTool::new()?)?;
        Ok(registry)
    }

    /// Basic tools plus the file manager, web API and data processor,
    /// configured from `config`.
    #[inline]
    pub fn with_default_tools(config: &Config) -> Result<Self, ToolError> {
        let mut registry = Self::basic()?;
        registry.register(FileManagerTool::new(config.file_manager.clone())?)?;
        registry.register(WebApiTool::new(config.web_api.clone())?)?;
        registry.register(DataProcessorTool::new(config.data_processor.clone())?)?;
        Ok(registry)
    }

    /// Add a tool. Names are unique within a registry.
    #[inline]
    pub fn register<T>(&mut self, tool: T) -> Result<(), ToolError>
    where
        T: McpTool + 'static,
    {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::InvalidInput(format!(
                "tool '{}' is already registered",
                name
            )));
        }
        debug!("Registered tool: {}", name);
        self.tools.insert(name, Arc::new(tool));
        Ok(())
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<Arc<dyn McpTool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names, sorted.
    #[inline]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Descriptors in name order.
    #[inline]
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.descriptor())
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch a call by name through [`McpTool::safe_execute`].
    #[inline]
    pub async fn call(&self, name: &str, args: Map<String, Value>) -> ToolResult {
        match self.tools.get(name) {
            Some(tool) => tool.safe_execute(args).await,
            None => {
                warn!("Call to unknown tool '{}'", name);
                ToolResult::failure(format!("tool '{}' not found", name))
            }
        }
    }

    /// Expose every registered tool through `server`.
    #[inline]
    pub async fn register_with_server(&self, server: &McpServer) -> Result<()> {
        for name in self.names() {
            if let Some(tool) = self.tools.get(name) {
                let handler = McpToolHandler::new(Arc::clone(tool));
                server.register_tool(handler.tool_definition(), handler).await?;
            }
        }
        Ok(())
    }
}

/// Adapts an [`McpTool`] to the server's [`ToolHandler`] trait.
pub struct McpToolHandler {
    tool: Arc<dyn McpTool>,
}

impl McpToolHandler {
    #[inline]
    pub fn new(tool: Arc<dyn McpTool>) -> Self {
        Self { tool }
    }

    /// MCP tool definition advertised in `tools/list`.
    #[inline]
    pub fn tool_definition(&self) -> Tool {
        let descriptor = self.tool.descriptor();
        Tool {
            name: descriptor.name().to_string(),
            description: Some(descriptor.description().to_string()),
            input_schema: descriptor.input_schema(),
        }
    }
}

#[async_trait]
impl ToolHandler for McpToolHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();
        let result = self.tool.safe_execute(args).await;

        Ok(CallToolResult {
            content: vec![ToolContent::Text {
                text: result.text(),
            }],
            is_error: Some(!result.is_success()),
        })
    }
}
