//! Error types for the Claude agent protocol engine

use thiserror::Error;

/// Main error type for the SDK
#[derive(Error, Debug)]
pub enum ClaudeError {
    /// Claude Code CLI not found or not installed
    #[error("Claude Code CLI not found: {0}")]
    CliNotFound(String),

    /// Connection error, including use of a closed connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// Process execution error with exit code and stderr
    #[error("Process error (exit code {exit_code}): {message}")]
    Process {
        /// Error message
        message: String,
        /// Process exit code
        exit_code: i32,
        /// Standard error output
        stderr: Option<String>,
    },

    /// JSON decode error (framing or serde failure)
    #[error("JSON decode error: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// Message parse error with optional raw data
    #[error("Message parse error: {message}")]
    MessageParse {
        /// Error message
        message: String,
        /// Raw message data that failed to parse
        data: Option<serde_json::Value>,
    },

    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(String),

    /// Control protocol violation or misuse
    #[error("Control protocol error: {0}")]
    ControlProtocol(String),

    /// The remote side answered a control request with an error
    #[error("Control request '{subtype}' failed: {message}")]
    ControlRequest {
        /// Subtype of the request that failed
        subtype: String,
        /// Error text sent by the remote side
        message: String,
    },

    /// Hook execution error
    #[error("Hook error: {0}")]
    Hook(String),

    /// MCP (Model Context Protocol) error
    #[error("MCP error: {0}")]
    Mcp(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, ClaudeError>;

/// Message carried by every error that reports a closed connection
pub(crate) const CONNECTION_CLOSED: &str = "connection closed";

impl ClaudeError {
    /// Create a CLI not found error
    #[must_use]
    pub fn cli_not_found() -> Self {
        Self::CliNotFound(
            "Claude Code not found. Install with:\n\
             npm install -g @anthropic-ai/claude-code\n\
             \n\
             If already installed locally, try:\n\
             export PATH=\"$HOME/node_modules/.bin:$PATH\"\n\
             \n\
             Or set `cli_path` in the options"
                .to_string(),
        )
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create the error handed to waiters when the connection goes away
    #[must_use]
    pub fn connection_closed() -> Self {
        Self::Connection(CONNECTION_CLOSED.to_string())
    }

    /// Create a process error
    pub fn process(msg: impl Into<String>, exit_code: i32, stderr: Option<String>) -> Self {
        Self::Process {
            message: msg.into(),
            exit_code,
            stderr,
        }
    }

    /// Create a message parse error
    pub fn message_parse(msg: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self::MessageParse {
            message: msg.into(),
            data,
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a control protocol error
    pub fn control_protocol(msg: impl Into<String>) -> Self {
        Self::ControlProtocol(msg.into())
    }

    /// Create an error for a control request the remote side rejected
    pub fn control_request(subtype: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ControlRequest {
            subtype: subtype.into(),
            message: msg.into(),
        }
    }

    /// Create a JSON decode error from string
    pub fn json_decode(msg: impl Into<String>) -> Self {
        Self::JsonDecode(serde_json::Error::io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            msg.into(),
        )))
    }

    /// Create a hook error
    pub fn hook(msg: impl Into<String>) -> Self {
        Self::Hook(msg.into())
    }

    /// Create an MCP error
    pub fn mcp(msg: impl Into<String>) -> Self {
        Self::Mcp(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether the stream that produced this error can keep going
    ///
    /// Only framing failures qualify: the framer drops one malformed object
    /// and resumes. Everything else a transport yields ends the connection.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::JsonDecode(_))
    }

    /// Whether this error is a timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Whether this error reports a closed connection
    #[must_use]
    pub fn is_connection_closed(&self) -> bool {
        matches!(self, Self::Connection(msg) if msg == CONNECTION_CLOSED)
    }

    /// Text suitable for an `error` field on the wire
    ///
    /// Per-request failures are reported to the remote side without the
    /// category prefix that `Display` adds.
    #[must_use]
    pub fn wire_message(&self) -> String {
        match self {
            Self::Connection(msg)
            | Self::Transport(msg)
            | Self::ControlProtocol(msg)
            | Self::Hook(msg)
            | Self::Mcp(msg)
            | Self::Timeout(msg)
            | Self::InvalidConfig(msg)
            | Self::CliNotFound(msg) => msg.clone(),
            Self::MessageParse { message, .. }
            | Self::Process { message, .. }
            | Self::ControlRequest { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
