//! JSON-RPC dispatch for in-process servers

use serde_json::{Value, json};

use super::jsonrpc::{JsonRpcRequest, JsonRpcResponse, error_codes};
use super::tool::{SdkMcpTool, ToolArguments};

/// MCP protocol revision reported by `initialize`
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// An in-process MCP server: a name, a version and a fixed tool table
#[derive(Debug, Clone)]
pub struct SdkMcpServer {
    name: String,
    version: String,
    tools: Vec<SdkMcpTool>,
}

impl SdkMcpServer {
    /// Create an empty server with version `1.0.0`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "1.0.0".to_string(),
            tools: Vec::new(),
        }
    }

    /// Set the version reported to the agent
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add a tool
    ///
    /// A tool with the same name as an existing one replaces it in place.
    #[must_use]
    pub fn tool(mut self, tool: SdkMcpTool) -> Self {
        if let Some(slot) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            log::warn!(
                "Tool '{}' registered twice on server '{}'; keeping the last",
                tool.name(),
                self.name
            );
            *slot = tool;
        } else {
            self.tools.push(tool);
        }
        self
    }

    /// Server name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Server version
    #[must_use]
    pub fn server_version(&self) -> &str {
        &self.version
    }

    /// Registered tools, in registration order
    #[must_use]
    pub fn tools(&self) -> &[SdkMcpTool] {
        &self.tools
    }

    /// Answer one JSON-RPC message
    ///
    /// Never fails: unknown methods and tools, bad parameters and handler
    /// errors all become JSON-RPC error responses.
    pub async fn handle_message(&self, message: Value) -> JsonRpcResponse {
        let id = message.get("id").cloned();
        let request: JsonRpcRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_REQUEST,
                    format!("Invalid request: {e}"),
                );
            }
        };

        match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                request.id,
                json!({
                    "protocolVersion": MCP_PROTOCOL_VERSION,
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": self.name, "version": self.version},
                }),
            ),
            "tools/list" => {
                let tools: Vec<Value> = self
                    .tools
                    .iter()
                    .map(|tool| {
                        json!({
                            "name": tool.name(),
                            "description": tool.description(),
                            "inputSchema": tool.input_schema(),
                        })
                    })
                    .collect();
                JsonRpcResponse::success(request.id, json!({"tools": tools}))
            }
            "tools/call" => self.call_tool(request.id, request.params).await,
            "notifications/initialized" => JsonRpcResponse::success(None, json!({})),
            other => JsonRpcResponse::error(
                request.id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{other}' not found"),
            ),
        }
    }

    async fn call_tool(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                "tools/call requires a 'name' parameter",
            );
        };

        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            return JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Tool '{name}' not found"),
            );
        };

        let args: ToolArguments = match params.get("arguments") {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => ToolArguments::new(),
            Some(_) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "tools/call 'arguments' must be an object",
                );
            }
        };

        match tool.call(args).await {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
            },
            Err(e) => {
                log::debug!("Tool '{name}' on server '{}' failed: {e:#}", self.name);
                JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string())
            }
        }
    }
}
