//! In-process MCP servers
//!
//! An [`SdkMcpServer`] is a static table of tools that the agent reaches
//! through `mcp_message` control requests instead of a separate process. The
//! agent sees an ordinary MCP server; the handlers run inside this process on
//! the connection's dispatch tasks.
//!
//! # Example
//!
//! ```
//! use claude_agent_protocol::mcp::{ArgumentsExt, SdkMcpServer, SdkMcpTool, ToolResult};
//! use serde_json::json;
//!
//! let calculator = SdkMcpServer::new("calculator")
//!     .version("1.0.0")
//!     .tool(SdkMcpTool::new(
//!         "add",
//!         "Add two numbers",
//!         json!({"type": "object", "properties": {
//!             "a": {"type": "number"},
//!             "b": {"type": "number"}
//!         }}),
//!         |args| async move {
//!             let sum = args.require_f64("a")? + args.require_f64("b")?;
//!             Ok(ToolResult::text(format!("Sum: {sum}")))
//!         },
//!     ));
//!
//! assert_eq!(calculator.tools().len(), 1);
//! ```
//!
//! Handlers run concurrently with each other and with hook and permission
//! callbacks, so any state they share needs its own synchronization.

mod jsonrpc;
mod server;
mod tool;

pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, error_codes};
pub use server::{MCP_PROTOCOL_VERSION, SdkMcpServer};
pub use tool::{ArgumentsExt, SdkMcpTool, ToolArguments, ToolContent, ToolHandler, ToolResult};
