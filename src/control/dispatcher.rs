//! Handlers for control requests the agent sends to us
//!
//! Each inbound `control_request` is parsed into an [`InboundRequest`] by its
//! `subtype` and answered by exactly one handler. Every failure here is scoped
//! to the one request: the caller turns it into an `error` response and the
//! connection carries on.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::error::{ClaudeError, Result};
use crate::hooks::HookRegistry;
use crate::mcp::{JsonRpcResponse, SdkMcpServer, error_codes};
use crate::permissions::permission_response;
use crate::types::hooks::{HookContext, HookInput};
use crate::types::identifiers::{CallbackId, ToolName};
use crate::types::options::ClaudeAgentOptions;
use crate::types::permissions::{CanUseToolCallback, PermissionUpdate, ToolPermissionContext};

/// Body of a `can_use_tool` request
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionCheckRequest {
    /// Tool the agent wants to run
    pub tool_name: ToolName,
    /// Proposed tool input
    #[serde(default = "empty_object")]
    pub input: Value,
    /// Permission updates the agent suggests
    #[serde(default)]
    pub permission_suggestions: Vec<Value>,
    /// Path outside the allowed directories, if that triggered the check
    #[serde(default)]
    pub blocked_path: Option<String>,
}

/// Body of a `hook_callback` request
#[derive(Debug, Clone, Deserialize)]
pub struct HookCallbackRequest {
    /// Id issued during `initialize`
    pub callback_id: CallbackId,
    /// Event-specific input
    #[serde(default)]
    pub input: Value,
    /// Tool use the event belongs to
    #[serde(default)]
    pub tool_use_id: Option<String>,
}

/// Body of an `mcp_message` request
#[derive(Debug, Clone, Deserialize)]
pub struct McpMessageRequest {
    /// Name the server was registered under
    pub server_name: String,
    /// JSON-RPC message for that server
    #[serde(default)]
    pub message: Value,
}

/// Inbound control request, by subtype
#[derive(Debug, Clone)]
pub enum InboundRequest {
    /// `can_use_tool`
    CanUseTool(PermissionCheckRequest),
    /// `hook_callback`
    HookCallback(HookCallbackRequest),
    /// `mcp_message`
    McpMessage(McpMessageRequest),
}

impl InboundRequest {
    /// Parse a request body by its `subtype`
    ///
    /// # Errors
    /// Returns `ControlProtocol` for unknown subtypes and `JsonDecode` when
    /// required fields are missing
    pub fn parse(request: Value) -> Result<Self> {
        let subtype = request
            .get("subtype")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match subtype.as_str() {
            "can_use_tool" => Ok(Self::CanUseTool(serde_json::from_value(request)?)),
            "hook_callback" => Ok(Self::HookCallback(serde_json::from_value(request)?)),
            "mcp_message" => Ok(Self::McpMessage(serde_json::from_value(request)?)),
            other => Err(ClaudeError::control_protocol(format!(
                "unsupported control request subtype: {other}"
            ))),
        }
    }
}

/// Answers inbound control requests for one connection
pub struct Dispatcher {
    hooks: HookRegistry,
    can_use_tool: Option<CanUseToolCallback>,
    mcp_servers: HashMap<String, Arc<SdkMcpServer>>,
    cancellation: CancellationToken,
}

impl Dispatcher {
    /// Build the hook table and collect callbacks and SDK servers
    ///
    /// `cancellation` is handed to hook callbacks and fires on close.
    #[must_use]
    pub fn new(options: &ClaudeAgentOptions, cancellation: CancellationToken) -> Self {
        Self {
            hooks: HookRegistry::new(options.hooks.as_ref()),
            can_use_tool: options.can_use_tool.clone(),
            mcp_servers: options.mcp_servers.sdk_servers(),
            cancellation,
        }
    }

    /// Hook table of this connection
    #[must_use]
    pub const fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Produce the `response` payload for one inbound request body
    ///
    /// # Errors
    /// Returns the error to report back in the `error` response
    pub async fn dispatch(&self, request: Value) -> Result<Value> {
        match InboundRequest::parse(request)? {
            InboundRequest::CanUseTool(request) => self.check_permission(request).await,
            InboundRequest::HookCallback(request) => self.run_hook(request).await,
            InboundRequest::McpMessage(request) => Ok(self.route_mcp(request).await),
        }
    }

    async fn check_permission(&self, request: PermissionCheckRequest) -> Result<Value> {
        let Some(callback) = &self.can_use_tool else {
            return Err(ClaudeError::control_protocol(
                "canUseTool callback is not provided",
            ));
        };

        let suggestions = request
            .permission_suggestions
            .into_iter()
            .filter_map(|s| match serde_json::from_value::<PermissionUpdate>(s) {
                Ok(update) => Some(update),
                Err(e) => {
                    log::debug!("Skipping unrecognized permission suggestion: {e}");
                    None
                }
            })
            .collect();
        let context = ToolPermissionContext {
            suggestions,
            blocked_path: request.blocked_path,
        };

        let result = callback(request.tool_name, request.input.clone(), context).await?;
        Ok(permission_response(result, request.input))
    }

    async fn run_hook(&self, request: HookCallbackRequest) -> Result<Value> {
        let callback = self.hooks.resolve(&request.callback_id)?;
        let input = HookInput::from_value(request.input)?;
        let context = HookContext::new(self.cancellation.clone());

        let output = callback(input, request.tool_use_id, context).await?;
        Ok(serde_json::to_value(output)?)
    }

    async fn route_mcp(&self, request: McpMessageRequest) -> Value {
        let response = match self.mcp_servers.get(&request.server_name) {
            Some(server) => server.handle_message(request.message).await,
            None => JsonRpcResponse::error(
                request.message.get("id").cloned(),
                error_codes::METHOD_NOT_FOUND,
                format!("Server '{}' not found", request.server_name),
            ),
        };
        json!({ "mcp_response": response.into_value() })
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
