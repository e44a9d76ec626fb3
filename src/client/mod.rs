//! `ClaudeSDKClient` for bidirectional sessions
//!
//! The client is a thin handle over a streaming [`Connection`]: it spawns the
//! CLI, runs the `initialize` handshake, and from then on messages, control
//! requests and inbound callbacks all share the one connection.
//!
//! Every method takes `&self`, so the client can sit in an `Arc` while one
//! task reads replies and another sends messages or interrupts.
//!
//! # Example: Basic Usage
//!
//! ```no_run
//! use claude_agent_protocol::{ClaudeAgentOptions, ClaudeSDKClient, Message};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClaudeSDKClient::new(ClaudeAgentOptions::default()).await?;
//!
//! client.send_message("Hello, Claude!").await?;
//!
//! let mut replies = std::pin::pin!(client.receive_response());
//! while let Some(message) = replies.next().await {
//!     if let Message::Assistant(reply) = message? {
//!         log::info!("Claude: {}", reply.text());
//!     }
//! }
//!
//! client.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example: Interrupt from another task
//!
//! ```no_run
//! use std::sync::Arc;
//! use claude_agent_protocol::{ClaudeAgentOptions, ClaudeSDKClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(ClaudeSDKClient::new(ClaudeAgentOptions::default()).await?);
//! client.send_message("Write a long essay").await?;
//!
//! let interrupter = Arc::clone(&client);
//! tokio::spawn(async move {
//!     tokio::time::sleep(std::time::Duration::from_millis(500)).await;
//!     interrupter.interrupt().await
//! });
//!
//! while let Some(message) = client.next_message().await {
//!     if message?.is_result() {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod client_impl;

use crate::connection::Connection;
use crate::transport::{SubprocessTransport, Transport};
use crate::types::identifiers::SessionId;

/// Client for interactive, stateful conversations
///
/// Hooks, the permission callback and SDK MCP servers from the options are
/// served automatically for the lifetime of the client.
pub struct ClaudeSDKClient<T: Transport + 'static = SubprocessTransport> {
    connection: Connection<T>,
    session_id: SessionId,
}
