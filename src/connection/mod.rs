//! Control protocol engine
//!
//! A [`Connection`] multiplexes three flows over one transport:
//!
//! ```text
//!                      ┌──────────────────────────────┐
//!   Transport ───────► │ reader task (only reader)    │
//!                      │                              │
//!                      │  control_response ──► pending table ──► waiting caller
//!                      │  control_request  ──► spawned dispatch task ──┐
//!                      │  everything else  ──► bounded message channel │
//!                      └──────────────────────────────┘                │
//!   Transport ◄──── single locked write per envelope ◄─────────────────┘
//! ```
//!
//! - Conversational messages reach the consumer in the order they were
//!   written; a full channel stalls the reader, which is the only
//!   backpressure towards the agent.
//! - Responses are matched by request id, never by position.
//! - Each inbound control request runs on its own task, so a slow hook never
//!   delays unrelated messages.
//! - Closing releases every pending caller with a connection-closed error.
//!
//! # Example
//!
//! ```no_run
//! use claude_agent_protocol::connection::{Connection, ConnectionMode};
//! use claude_agent_protocol::transport::{PromptInput, SubprocessTransport};
//! use claude_agent_protocol::ClaudeAgentOptions;
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ClaudeAgentOptions::default();
//! let transport = SubprocessTransport::new(PromptInput::Stream, options.clone())?;
//! let connection = Connection::new(transport, ConnectionMode::Streaming, &options)?;
//!
//! connection.connect().await?;
//! connection.initialize().await?;
//! connection.send_user_message("Hello", &Default::default()).await?;
//!
//! let mut replies = std::pin::pin!(connection.receive_response());
//! while let Some(message) = replies.next().await {
//!     println!("{:?}", message?);
//! }
//! connection.close().await?;
//! # Ok(())
//! # }
//! ```

mod connection_impl;
mod tasks;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::control::{Dispatcher, ProtocolHandler};
use crate::error::Result;
use crate::transport::Transport;
use crate::types::messages::Message;

/// Whether the connection carries a control channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Bidirectional: handshake on start, control requests allowed
    Streaming,
    /// Single prompt: no handshake, outbound control requests rejected
    OneShot,
}

/// Lifecycle of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not started
    Disconnected,
    /// Transport open, handshake pending (streaming only)
    Initializing,
    /// Ready for traffic
    Active,
    /// `close` in progress
    Closing,
    /// Done; terminal
    Closed,
}

impl ConnectionState {
    /// Whether the connection can no longer be used
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }
}

/// State shared by the connection handle, the reader and dispatch tasks
pub(crate) struct Shared<T: Transport> {
    transport: tokio::sync::Mutex<T>,
    protocol: ProtocolHandler,
    dispatcher: Dispatcher,
    mode: ConnectionMode,
    state: parking_lot::Mutex<ConnectionState>,
    server_info: parking_lot::Mutex<Option<Value>>,
    first_result: watch::Sender<bool>,
    shutdown: CancellationToken,
    /// Child of `shutdown`; also fired by the reader when the stream ends
    terminated: CancellationToken,
    control_limit: Option<Semaphore>,
    initialize_timeout: Duration,
}

impl<T: Transport> Shared<T> {
    /// Write one serialized envelope under the transport lock
    async fn write(&self, line: &str) -> Result<()> {
        self.transport.lock().await.write(line).await
    }

    fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Move forward unless the connection is already going away
    fn advance(&self, to: ConnectionState) {
        let mut state = self.state.lock();
        if !state.is_terminal() {
            *state = to;
        }
    }

    fn set_state(&self, to: ConnectionState) {
        *self.state.lock() = to;
    }

    /// The stream is gone: fail every pending request and mark the connection closed
    ///
    /// Waiters drained here get `reason`; a request that registers after the
    /// drain is released by `terminated`, which it also waits on.
    fn terminate(&self, reason: impl Fn() -> crate::error::ClaudeError) {
        self.protocol.fail_all(reason);
        self.terminated.cancel();
        self.set_state(ConnectionState::Closed);
    }

    /// Fire the first-result signal; later calls are no-ops
    fn signal_first_result(&self) {
        self.first_result.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        });
    }
}

/// Protocol engine over one transport
///
/// All methods take `&self`, so a connection can be shared behind an `Arc`
/// and used from several tasks: one consuming messages while others issue
/// control requests.
pub struct Connection<T: Transport + 'static> {
    shared: Arc<Shared<T>>,
    message_tx: parking_lot::Mutex<Option<mpsc::Sender<Result<Message>>>>,
    message_rx: tokio::sync::Mutex<mpsc::Receiver<Result<Message>>>,
    reader_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}
