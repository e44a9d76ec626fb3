//! # Claude Agent Protocol
//!
//! An async Rust engine and SDK for driving the Claude Code agent over its
//! newline-delimited JSON protocol. The agent runs as a child process; this
//! crate frames its output, classifies messages, correlates control requests
//! with their responses and answers the agent's own requests for permission
//! checks, hook callbacks and in-process MCP tools.
//!
//! ## Quick Start
//!
//! The simplest way in is [`query()`]:
//!
//! ```no_run
//! use claude_agent_protocol::{Message, query};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut stream = std::pin::pin!(query("What is 2 + 2?", None).await?);
//!
//!     while let Some(message) = stream.next().await {
//!         if let Message::Assistant(reply) = message? {
//!             log::info!("Claude: {}", reply.text());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Interactive sessions
//!
//! [`ClaudeSDKClient`] keeps one process alive across turns and supports
//! `interrupt`, `set_permission_mode` and `set_model`:
//!
//! ```no_run
//! # use claude_agent_protocol::{ClaudeAgentOptions, ClaudeSDKClient};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ClaudeAgentOptions::builder().max_turns(10).build();
//!
//! let client = ClaudeSDKClient::new(options).await?;
//! client.send_message("Hello, Claude!").await?;
//!
//! while let Some(message) = client.next_message().await {
//!     if message?.is_result() {
//!         break;
//!     }
//! }
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Hooks
//!
//! ```no_run
//! # use claude_agent_protocol::{ClaudeAgentOptions, HookEvent, HookManager, HookMatcherBuilder, HookOutput};
//! let audit = HookManager::callback(|input, tool_use_id, _ctx| async move {
//!     log::info!("{:?} ({tool_use_id:?})", input.tool_name());
//!     Ok(HookOutput::default())
//! });
//!
//! let options = ClaudeAgentOptions::builder()
//!     .add_hook(
//!         HookEvent::PreToolUse,
//!         HookMatcherBuilder::new(Some("Bash")).add_hook(audit).build(),
//!     )
//!     .build();
//! ```
//!
//! ## Permission control
//!
//! ```no_run
//! # use claude_agent_protocol::{ClaudeAgentOptions, PermissionManager, PermissionResult};
//! let gate = PermissionManager::callback(|tool_name, _input, _ctx| async move {
//!     match tool_name.as_str() {
//!         "Read" | "Glob" => Ok(PermissionResult::allow()),
//!         _ => Ok(PermissionResult::deny("Tool not allowed")),
//!     }
//! });
//!
//! let options = ClaudeAgentOptions::builder().can_use_tool(gate).build();
//! ```
//!
//! ## Architecture
//!
//! - [`transport`]: the [`Transport`] trait, the line framer and the subprocess
//!   implementation
//! - [`message`]: classification of conversational messages
//! - [`control`]: wire envelopes, request correlation and inbound dispatch
//! - [`connection`]: the engine that ties them together
//! - [`hooks`], [`permissions`], [`mcp`]: the callbacks the agent can reach
//! - [`client`], [`query()`]: the high-level entry points
//! - [`types`], [`error`]: shared types
//!
//! The library logs through the `log` facade and never installs a logger.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod connection;
pub mod control;
pub mod error;
pub mod hooks;
pub mod mcp;
pub mod message;
pub mod permissions;
pub mod query;
pub mod transport;
pub mod types;

pub use client::ClaudeSDKClient;
pub use connection::{Connection, ConnectionMode, ConnectionState};
pub use error::{ClaudeError, Result};
pub use hooks::{HookManager, HookMatcherBuilder, HookRegistry};
pub use mcp::{ArgumentsExt, SdkMcpServer, SdkMcpTool, ToolArguments, ToolContent, ToolResult};
pub use message::parse_message;
pub use permissions::PermissionManager;
pub use query::{query, query_text, query_with_transport};
pub use transport::{JsonLineCodec, PromptInput, SubprocessTransport, Transport};

pub use types::agent::{AgentDefinition, SystemPrompt, SystemPromptPreset};
pub use types::hooks::{
    HookCallback, HookContext, HookDecision, HookEvent, HookInput, HookMatcher, HookOutput,
    HookSpecificOutput,
};
pub use types::identifiers::{CallbackId, RequestId, SessionId, ToolName};
pub use types::mcp::{
    McpHttpServerConfig, McpServerConfig, McpServers, McpStdioServerConfig, McpStreamableHttpConfig,
};
pub use types::messages::{
    AssistantMessage, ContentBlock, ContentValue, Message, ResultMessage, StreamEvent,
    SystemMessage, UserContent, UserMessage,
};
pub use types::options::{ClaudeAgentOptions, ClaudeAgentOptionsBuilder, StderrCallback};
pub use types::permissions::{
    CanUseToolCallback, PermissionBehavior, PermissionMode, PermissionResult,
    PermissionResultAllow, PermissionResultDeny, PermissionRuleValue, PermissionUpdate,
    PermissionUpdateDestination, SettingSource, ToolPermissionContext,
};

/// Version of the SDK
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
