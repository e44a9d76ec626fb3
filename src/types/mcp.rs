//! MCP (Model Context Protocol) server configuration types
//!
//! External servers are described to the CLI and run by it. SDK servers run
//! in this process and are reached through `mcp_message` control requests;
//! only their name crosses the process boundary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::mcp::SdkMcpServer;

// ============================================================================
// MCP Server Types
// ============================================================================

/// MCP stdio server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpStdioServerConfig {
    /// Server type (stdio)
    #[serde(skip_serializing_if = "Option::is_none", rename = "type")]
    pub server_type: Option<String>,
    /// Command to execute
    pub command: String,
    /// Command arguments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Environment variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
}

/// MCP StreamableHTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpStreamableHttpConfig {
    /// Server type (streamable_http)
    #[serde(rename = "type")]
    pub server_type: String,
    /// Server URL
    pub url: String,
    /// HTTP headers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

/// MCP HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpHttpServerConfig {
    /// Server type (http)
    #[serde(rename = "type")]
    pub server_type: String,
    /// Server URL
    pub url: String,
    /// HTTP headers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

/// MCP server configuration enum
#[derive(Debug, Clone)]
pub enum McpServerConfig {
    /// Stdio-based MCP server
    Stdio(McpStdioServerConfig),
    /// StreamableHTTP-based MCP server
    StreamableHttp(McpStreamableHttpConfig),
    /// HTTP-based MCP server
    Http(McpHttpServerConfig),
    /// SDK-based in-process MCP server
    Sdk(Arc<SdkMcpServer>),
}

impl McpServerConfig {
    /// Configuration object for `--mcp-config`
    #[must_use]
    pub fn to_cli_value(&self) -> serde_json::Value {
        match self {
            Self::Stdio(stdio) => serde_json::to_value(stdio).unwrap_or_default(),
            Self::StreamableHttp(http) => serde_json::to_value(http).unwrap_or_default(),
            Self::Http(http) => serde_json::to_value(http).unwrap_or_default(),
            Self::Sdk(server) => serde_json::json!({"type": "sdk", "name": server.name()}),
        }
    }
}

impl From<SdkMcpServer> for McpServerConfig {
    fn from(server: SdkMcpServer) -> Self {
        Self::Sdk(Arc::new(server))
    }
}

/// MCP servers container
#[derive(Debug, Clone, Default)]
pub enum McpServers {
    /// No MCP servers
    #[default]
    None,
    /// Dictionary of MCP servers
    Dict(HashMap<String, McpServerConfig>),
    /// Path to MCP servers configuration file
    Path(PathBuf),
}

impl McpServers {
    /// In-process servers keyed by the name the agent addresses them with
    #[must_use]
    pub fn sdk_servers(&self) -> HashMap<String, Arc<SdkMcpServer>> {
        match self {
            Self::Dict(servers) => servers
                .iter()
                .filter_map(|(key, config)| match config {
                    McpServerConfig::Sdk(server) => Some((key.clone(), Arc::clone(server))),
                    _ => None,
                })
                .collect(),
            Self::None | Self::Path(_) => HashMap::new(),
        }
    }
}
