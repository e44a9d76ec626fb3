//! Constructor and public API of `ClaudeSDKClient`

use std::time::Duration;

use futures::Stream;
use serde_json::Value;

use crate::connection::{Connection, ConnectionMode};
use crate::error::Result;
use crate::transport::{PromptInput, SubprocessTransport, Transport};
use crate::types::identifiers::SessionId;
use crate::types::messages::Message;
use crate::types::options::ClaudeAgentOptions;
use crate::types::permissions::PermissionMode;

use super::ClaudeSDKClient;

impl ClaudeSDKClient<SubprocessTransport> {
    /// Spawn the CLI in streaming mode and complete the handshake
    ///
    /// # Errors
    /// Returns error if the options are inconsistent, the CLI cannot be found
    /// or started, or the handshake fails
    pub async fn new(options: ClaudeAgentOptions) -> Result<Self> {
        options.validate()?;
        let transport = SubprocessTransport::new(PromptInput::Stream, options.clone())?;
        Self::from_transport(transport, options).await
    }
}

impl<T: Transport + 'static> ClaudeSDKClient<T> {
    /// Run a session over any transport
    ///
    /// The transport is closed again if connecting or the handshake fails.
    ///
    /// # Errors
    /// Returns error if the options are inconsistent or the handshake fails
    pub async fn from_transport(transport: T, options: ClaudeAgentOptions) -> Result<Self> {
        let connection = Connection::new(transport, ConnectionMode::Streaming, &options)?;

        let started = async {
            connection.connect().await?;
            connection.initialize().await
        }
        .await;

        if let Err(e) = started {
            log::debug!("Session start failed: {e}");
            if let Err(close_err) = connection.close().await {
                log::debug!("Ignoring close error after failed start: {close_err}");
            }
            return Err(e);
        }

        Ok(Self {
            connection,
            session_id: SessionId::default(),
        })
    }

    /// Use `session_id` for messages sent from now on
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Send a user message
    ///
    /// # Errors
    /// Returns error if the session is closed or the write fails
    pub async fn send_message(&self, content: impl Into<String>) -> Result<()> {
        self.connection
            .send_user_message(content.into(), &self.session_id)
            .await
    }

    /// Send a user message made of content blocks
    ///
    /// # Errors
    /// Returns error if the session is closed or the write fails
    pub async fn send_content(&self, blocks: Vec<Value>) -> Result<()> {
        self.connection
            .send_user_message(Value::Array(blocks), &self.session_id)
            .await
    }

    /// Stop the current run
    ///
    /// # Errors
    /// Returns error if the agent rejects the request or the session closes
    pub async fn interrupt(&self) -> Result<()> {
        self.connection.interrupt().await
    }

    /// Change the permission mode
    ///
    /// # Errors
    /// Returns error if the agent rejects the request or the session closes
    pub async fn set_permission_mode(&self, mode: PermissionMode) -> Result<()> {
        self.connection.set_permission_mode(mode).await
    }

    /// Switch models; `None` returns to the default
    ///
    /// # Errors
    /// Returns error if the agent rejects the request or the session closes
    pub async fn set_model(&self, model: Option<String>) -> Result<()> {
        self.connection.set_model(model).await
    }

    /// Next message; `None` once the session has ended
    pub async fn next_message(&self) -> Option<Result<Message>> {
        self.connection.next_message().await
    }

    /// Messages up to and including the next `result`
    pub fn receive_response(&self) -> impl Stream<Item = Result<Message>> + '_ {
        self.connection.receive_response()
    }

    /// Every remaining message
    pub fn messages(&self) -> impl Stream<Item = Result<Message>> + '_ {
        self.connection.messages()
    }

    /// Wait until the agent has produced its first `result`
    pub async fn wait_for_first_result(&self, timeout: Duration) -> bool {
        self.connection.wait_for_first_result(timeout).await
    }

    /// What the agent reported during the handshake
    #[must_use]
    pub fn server_info(&self) -> Option<Value> {
        self.connection.server_info()
    }

    /// Underlying connection
    #[must_use]
    pub const fn connection(&self) -> &Connection<T> {
        &self.connection
    }

    /// End the session and release the transport
    ///
    /// # Errors
    /// Returns error if the transport fails to close cleanly
    pub async fn close(&self) -> Result<()> {
        self.connection.close().await
    }
}
