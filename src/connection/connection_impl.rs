//! Public API of [`Connection`]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::Stream;
use serde_json::{Value, json};
use tokio::sync::{Semaphore, mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::control::protocol::PendingGuard;
use crate::control::{ControlMessage, Dispatcher, OutboundRequest, ProtocolHandler};
use crate::error::{ClaudeError, Result};
use crate::transport::Transport;
use crate::types::identifiers::SessionId;
use crate::types::messages::Message;
use crate::types::options::ClaudeAgentOptions;
use crate::types::permissions::PermissionMode;

use super::{Connection, ConnectionMode, ConnectionState, Shared, tasks};

impl<T: Transport + 'static> Connection<T> {
    /// Wrap a transport; nothing is started until [`connect`](Self::connect)
    ///
    /// Hooks, the permission callback, SDK servers and the engine limits are
    /// taken from `options`.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `options` fail [`validate`](ClaudeAgentOptions::validate)
    pub fn new(transport: T, mode: ConnectionMode, options: &ClaudeAgentOptions) -> Result<Self> {
        options.validate()?;
        let shutdown = CancellationToken::new();
        let (message_tx, message_rx) = mpsc::channel(options.effective_message_channel_capacity());
        let (first_result, _) = watch::channel(false);

        let shared = Shared {
            transport: tokio::sync::Mutex::new(transport),
            protocol: ProtocolHandler::new(),
            dispatcher: Dispatcher::new(options, shutdown.clone()),
            mode,
            state: parking_lot::Mutex::new(ConnectionState::Disconnected),
            server_info: parking_lot::Mutex::new(None),
            first_result,
            terminated: shutdown.child_token(),
            shutdown,
            control_limit: options.max_concurrent_control_requests.map(Semaphore::new),
            initialize_timeout: options.effective_initialize_timeout(),
        };

        Ok(Self {
            shared: Arc::new(shared),
            message_tx: parking_lot::Mutex::new(Some(message_tx)),
            message_rx: tokio::sync::Mutex::new(message_rx),
            reader_task: parking_lot::Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    /// Open the transport and start the reader task
    ///
    /// Streaming connections move to `Initializing` and still need
    /// [`initialize`](Self::initialize); one-shot connections are `Active`
    /// right away.
    ///
    /// # Errors
    /// Returns error if the connection was already started or the transport
    /// fails to open
    pub async fn connect(&self) -> Result<()> {
        let state = self.shared.state();
        if state != ConnectionState::Disconnected {
            return Err(ClaudeError::control_protocol(format!(
                "cannot connect from state {state:?}"
            )));
        }

        let incoming = {
            let mut transport = self.shared.transport.lock().await;
            transport.connect().await?;
            transport.read_messages()
        };

        let message_tx = self
            .message_tx
            .lock()
            .take()
            .ok_or_else(|| ClaudeError::control_protocol("connection already started"))?;

        self.shared.advance(match self.shared.mode {
            ConnectionMode::Streaming => ConnectionState::Initializing,
            ConnectionMode::OneShot => ConnectionState::Active,
        });

        let handle = tokio::spawn(tasks::reader_loop(
            Arc::clone(&self.shared),
            incoming,
            message_tx,
        ));
        *self.reader_task.lock() = Some(handle);
        Ok(())
    }

    /// Run the `initialize` handshake
    ///
    /// Sends the hook table and waits (default 60s) for the agent's answer,
    /// which is kept for [`server_info`](Self::server_info). Returns `None`
    /// in one-shot mode, where there is no handshake.
    ///
    /// # Errors
    /// Returns `Timeout` if the agent does not answer in time, or the error
    /// the agent reported
    pub async fn initialize(&self) -> Result<Option<Value>> {
        if self.shared.mode == ConnectionMode::OneShot {
            return Ok(None);
        }

        let state = self.shared.state();
        if state != ConnectionState::Initializing {
            return Err(ClaudeError::control_protocol(format!(
                "cannot initialize from state {state:?}"
            )));
        }

        let request = OutboundRequest::Initialize {
            hooks: self.shared.dispatcher.hooks().wire_config(),
        };
        let info = self
            .send_control_request(request, Some(self.shared.initialize_timeout))
            .await?;

        *self.shared.server_info.lock() = Some(info.clone());
        self.shared.advance(ConnectionState::Active);
        log::debug!("Control protocol initialized");
        Ok(Some(info))
    }

    /// Send a control request and wait for its response payload
    ///
    /// Without a timeout the call waits until the response arrives or the
    /// connection closes. Dropping the returned future abandons the wait;
    /// a response that arrives later is discarded.
    ///
    /// # Errors
    /// - `ControlProtocol` in one-shot mode
    /// - `Connection` if the connection is or becomes closed
    /// - `Timeout` if `timeout` elapses first
    /// - `ControlRequest` if the agent answers with an error
    pub async fn send_control_request(
        &self,
        request: OutboundRequest,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        if self.shared.mode == ConnectionMode::OneShot {
            return Err(ClaudeError::control_protocol(
                "control requests require streaming mode",
            ));
        }
        if self.is_closed() {
            return Err(ClaudeError::connection_closed());
        }

        let shared = &*self.shared;
        let subtype = request.subtype();
        let id = shared.protocol.next_id();
        let line = shared
            .protocol
            .serialize_message(&ControlMessage::request(id.clone(), &request)?)?;

        let response_rx = shared.protocol.register(id.clone(), subtype)?;
        let _pending = PendingGuard::new(&shared.protocol, id.clone());

        // close() or the reader may have drained the table before we registered
        if shared.terminated.is_cancelled() {
            return Err(ClaudeError::connection_closed());
        }

        shared.write(&line).await?;
        log::debug!("Sent control request {id} ({subtype})");

        let wait = async {
            tokio::select! {
                biased;
                response = response_rx => response.unwrap_or_else(|_| Err(ClaudeError::connection_closed())),
                () = shared.terminated.cancelled() => Err(ClaudeError::connection_closed()),
            }
        };

        match timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
                ClaudeError::timeout(format!(
                    "control request '{subtype}' got no response within {limit:?}"
                ))
            })?,
            None => wait.await,
        }
    }

    /// Ask the agent to stop the current run
    ///
    /// # Errors
    /// See [`send_control_request`](Self::send_control_request)
    pub async fn interrupt(&self) -> Result<()> {
        self.send_control_request(OutboundRequest::Interrupt, None)
            .await
            .map(drop)
    }

    /// Change the permission mode
    ///
    /// # Errors
    /// See [`send_control_request`](Self::send_control_request)
    pub async fn set_permission_mode(&self, mode: PermissionMode) -> Result<()> {
        self.send_control_request(OutboundRequest::SetPermissionMode { mode }, None)
            .await
            .map(drop)
    }

    /// Switch models; `None` returns to the default
    ///
    /// # Errors
    /// See [`send_control_request`](Self::send_control_request)
    pub async fn set_model(&self, model: Option<String>) -> Result<()> {
        self.send_control_request(OutboundRequest::SetModel { model }, None)
            .await
            .map(drop)
    }

    /// Write a user message
    ///
    /// `content` is either a string or an array of content blocks.
    ///
    /// # Errors
    /// Returns error if the connection is closed or the write fails
    pub async fn send_user_message(
        &self,
        content: impl Into<Value>,
        session_id: &SessionId,
    ) -> Result<()> {
        if self.is_closed() {
            return Err(ClaudeError::connection_closed());
        }

        let message = json!({
            "type": "user",
            "message": {"role": "user", "content": content.into()},
            "parent_tool_use_id": null,
            "session_id": session_id,
        });
        let line = format!("{}\n", serde_json::to_string(&message)?);
        self.shared.write(&line).await
    }

    /// Close the write side of the transport
    ///
    /// # Errors
    /// Returns error if the transport fails to close its input
    pub async fn end_input(&self) -> Result<()> {
        self.shared.transport.lock().await.end_input().await
    }

    /// Next conversational message; `None` once the stream has ended
    pub async fn next_message(&self) -> Option<Result<Message>> {
        self.message_rx.lock().await.recv().await
    }

    /// Messages up to and including the next `result`
    pub fn receive_response(&self) -> impl Stream<Item = Result<Message>> + '_ {
        async_stream::stream! {
            let mut rx = self.message_rx.lock().await;
            while let Some(item) = rx.recv().await {
                let done = matches!(&item, Ok(message) if message.is_result());
                yield item;
                if done {
                    break;
                }
            }
        }
    }

    /// Every remaining message until the stream ends
    pub fn messages(&self) -> impl Stream<Item = Result<Message>> + '_ {
        async_stream::stream! {
            let mut rx = self.message_rx.lock().await;
            while let Some(item) = rx.recv().await {
                yield item;
            }
        }
    }

    /// Payload the agent returned from `initialize`
    #[must_use]
    pub fn server_info(&self) -> Option<Value> {
        self.shared.server_info.lock().clone()
    }

    /// Wait until the first `result` message has been read
    ///
    /// Does not consume any message. Returns `false` on timeout.
    pub async fn wait_for_first_result(&self, timeout: Duration) -> bool {
        let mut signal = self.shared.first_result.subscribe();
        matches!(
            tokio::time::timeout(timeout, signal.wait_for(|fired| *fired)).await,
            Ok(Ok(_))
        )
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Mode the connection was created with
    #[must_use]
    pub fn mode(&self) -> ConnectionMode {
        self.shared.mode
    }

    /// Outbound control requests still awaiting a response
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.shared.protocol.pending_count()
    }

    /// Whether the connection is closed or closing
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.shared.state().is_terminal()
    }

    /// Shut the connection down
    ///
    /// Releases every pending caller with a connection-closed error, stops the
    /// reader and abandons in-flight inbound handlers, invalidates hook ids
    /// and closes the transport. Calling it again is a no-op.
    ///
    /// # Errors
    /// Returns the transport's close error, if any
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.shared.set_state(ConnectionState::Closing);
        self.shared.shutdown.cancel();

        let released = self.shared.protocol.fail_all(ClaudeError::connection_closed);
        if released > 0 {
            log::debug!("Released {released} pending control request(s) on close");
        }
        self.shared.dispatcher.hooks().clear();

        if let Some(task) = self.reader_task.lock().take() {
            task.abort();
        }
        drop(self.message_tx.lock().take());

        let result = self.shared.transport.lock().await.close().await;
        self.shared.set_state(ConnectionState::Closed);
        result
    }
}

impl<T: Transport + 'static> Drop for Connection<T> {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
        if let Some(task) = self.reader_task.get_mut().take() {
            task.abort();
        }
    }
}

impl<T: Transport + 'static> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("mode", &self.shared.mode)
            .field("state", &self.shared.state())
            .field("pending_requests", &self.shared.protocol.pending_count())
            .finish_non_exhaustive()
    }
}
