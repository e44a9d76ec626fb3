//! Transport layer between the protocol engine and the agent process
//!
//! A [`Transport`] moves newline-terminated JSON text out and decoded JSON
//! objects in. The engine never touches the process directly: it writes
//! serialized envelopes with [`Transport::write`] and consumes the receiver
//! returned by [`Transport::read_messages`] from a single reader task.

pub mod codec;
pub mod subprocess;

use std::future::Future;

use tokio::sync::mpsc;

use crate::error::Result;

/// Byte-stream collaborator the protocol engine runs on
///
/// Implementations must deliver objects in the order the remote side wrote
/// them. Framing failures are delivered as recoverable `Err` items
/// ([`ClaudeError::is_recoverable`](crate::ClaudeError::is_recoverable));
/// any other `Err` item is treated as the end of the connection.
pub trait Transport: Send + Sync {
    /// Open the underlying stream
    ///
    /// # Errors
    /// Returns error if the stream cannot be opened
    fn connect(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Write serialized data (already newline-terminated) in one piece
    ///
    /// # Errors
    /// Returns error if the write fails or the transport is not ready
    fn write(&mut self, data: &str) -> impl Future<Output = Result<()>> + Send;

    /// Close the write side while leaving the read side open
    ///
    /// # Errors
    /// Returns error if closing fails
    fn end_input(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Take the stream of decoded objects
    ///
    /// Called once per connection. The channel closes when the remote side
    /// ends the stream.
    fn read_messages(&mut self) -> mpsc::Receiver<Result<serde_json::Value>>;

    /// Whether the transport accepts writes
    fn is_ready(&self) -> bool;

    /// Release the stream and anything behind it
    ///
    /// # Errors
    /// Returns error if cleanup fails
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

pub use codec::JsonLineCodec;
pub use subprocess::{PromptInput, SubprocessTransport};
