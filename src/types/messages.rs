//! Message-related type definitions
//!
//! Conversational messages are the objects the agent emits that are not
//! control envelopes. [`crate::message::parse_message`] builds these from raw
//! JSON; they are immutable once handed to the consumer.

use super::identifiers::SessionId;
use serde::{Deserialize, Serialize};

// ============================================================================
// Content Blocks
// ============================================================================

/// Content value for tool results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
    /// String content
    String(String),
    /// Structured content blocks
    Blocks(Vec<serde_json::Value>),
}

/// Content block types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content block
    Text {
        /// Text content
        text: String,
    },
    /// Thinking content block (extended thinking)
    Thinking {
        /// Thinking content
        thinking: String,
        /// Signature for verification
        #[serde(default)]
        signature: String,
    },
    /// Tool use request
    ToolUse {
        /// Tool use ID
        id: String,
        /// Tool name
        name: String,
        /// Tool input parameters
        #[serde(default)]
        input: serde_json::Value,
    },
    /// Tool execution result
    ToolResult {
        /// ID of the tool use this is a result for
        tool_use_id: String,
        /// Result content
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<ContentValue>,
        /// Whether this is an error result
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// User content can be a plain string or blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserContent {
    /// Plain string content
    String(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

// ============================================================================
// Messages
// ============================================================================

/// A user turn, either typed by the application or replayed by the agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserMessage {
    /// Message content
    pub content: UserContent,
    /// Parent tool use ID for nested conversations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_tool_use_id: Option<String>,
    /// Session ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// Message UUID, when the agent assigns one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// A model response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantMessage {
    /// Model that generated the message
    pub model: String,
    /// Message content blocks, in order; unrecognized blocks are omitted
    pub content: Vec<ContentBlock>,
    /// API error classification, if the turn failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Parent tool use ID for nested conversations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_tool_use_id: Option<String>,
    /// Session ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl AssistantMessage {
    /// Concatenated text of all text blocks
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// System notification such as `init`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemMessage {
    /// System message subtype
    pub subtype: String,
    /// The complete raw object
    pub data: serde_json::Value,
}

/// Terminal message of an exchange, with metrics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultMessage {
    /// Result subtype
    pub subtype: String,
    /// Total duration in milliseconds
    pub duration_ms: u64,
    /// API call duration in milliseconds
    pub duration_api_ms: u64,
    /// Whether this is an error result
    pub is_error: bool,
    /// Number of conversation turns
    pub num_turns: u32,
    /// Session ID
    pub session_id: SessionId,
    /// Total cost in USD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,
    /// Token usage statistics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,
    /// Final result text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Output matching a requested JSON schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_output: Option<serde_json::Value>,
}

/// Partial-message stream event
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamEvent {
    /// Event UUID
    pub uuid: String,
    /// Session ID
    pub session_id: SessionId,
    /// Raw stream event data
    pub event: serde_json::Value,
    /// Parent tool use ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_tool_use_id: Option<String>,
}

/// Conversational message delivered to the consumer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// User message
    User(UserMessage),
    /// Assistant message
    Assistant(AssistantMessage),
    /// System message
    System(SystemMessage),
    /// Result message with metrics
    Result(ResultMessage),
    /// Stream event for partial messages
    StreamEvent(StreamEvent),
}

impl Message {
    /// Whether this is the terminal `result` message of an exchange
    #[must_use]
    pub const fn is_result(&self) -> bool {
        matches!(self, Self::Result(_))
    }

    /// Session the message belongs to, when it says
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::User(m) => m.session_id.as_ref(),
            Self::Assistant(m) => m.session_id.as_ref(),
            Self::Result(m) => Some(&m.session_id),
            Self::StreamEvent(m) => Some(&m.session_id),
            Self::System(_) => None,
        }
    }
}
