//! One-shot queries
//!
//! [`query`] runs the CLI once with the prompt on its command line and streams
//! every message until the process exits. There is no handshake, so control
//! requests such as `interrupt` are unavailable; use
//! [`ClaudeSDKClient`](crate::ClaudeSDKClient) for that.
//!
//! ```no_run
//! use claude_agent_protocol::{Message, query};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut messages = std::pin::pin!(query("What is 2 + 2?", None).await?);
//! while let Some(message) = messages.next().await {
//!     if let Message::Result(result) = message? {
//!         log::info!("done in {} turns", result.num_turns);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use futures::{Stream, StreamExt};

use crate::connection::{Connection, ConnectionMode};
use crate::error::Result;
use crate::transport::{PromptInput, SubprocessTransport, Transport};
use crate::types::messages::Message;
use crate::types::options::ClaudeAgentOptions;

/// Run a prompt to completion
///
/// The returned stream owns the connection and closes it after the last
/// message.
///
/// # Errors
/// Returns error if the options are inconsistent or the CLI cannot be started
pub async fn query(
    prompt: impl Into<String>,
    options: Option<ClaudeAgentOptions>,
) -> Result<impl Stream<Item = Result<Message>>> {
    let options = options.unwrap_or_default();
    options.validate()?;
    let transport = SubprocessTransport::new(PromptInput::String(prompt.into()), options.clone())?;
    query_with_transport(transport, options).await
}

/// Run a one-shot exchange over an already constructed transport
///
/// # Errors
/// Returns error if the options are inconsistent or the transport fails to open
pub async fn query_with_transport<T: Transport + 'static>(
    transport: T,
    options: ClaudeAgentOptions,
) -> Result<impl Stream<Item = Result<Message>>> {
    let connection = Connection::new(transport, ConnectionMode::OneShot, &options)?;
    if let Err(e) = connection.connect().await {
        if let Err(close_err) = connection.close().await {
            log::debug!("Ignoring close error after failed connect: {close_err}");
        }
        return Err(e);
    }

    Ok(async_stream::stream! {
        while let Some(item) = connection.next_message().await {
            yield item;
        }
        if let Err(e) = connection.close().await {
            log::debug!("Close after one-shot query failed: {e}");
        }
    })
}

/// Run a prompt and return the assistant's text
///
/// Text blocks of every assistant message up to the `result` are joined with
/// newlines.
///
/// # Errors
/// Returns the first error the stream yields
pub async fn query_text(
    prompt: impl Into<String>,
    options: Option<ClaudeAgentOptions>,
) -> Result<String> {
    let messages = query(prompt, options).await?;
    collect_text(messages).await
}

async fn collect_text(messages: impl Stream<Item = Result<Message>>) -> Result<String> {
    let mut messages = std::pin::pin!(messages);
    let mut parts = Vec::new();
    while let Some(message) = messages.next().await {
        match message? {
            Message::Assistant(reply) => {
                let text = reply.text();
                if !text.is_empty() {
                    parts.push(text);
                }
            }
            Message::Result(_) => break,
            _ => {}
        }
    }
    Ok(parts.join("\n"))
}
