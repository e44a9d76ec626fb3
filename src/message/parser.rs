//! Message parser for agent output

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClaudeError, Result};
use crate::types::identifiers::SessionId;
use crate::types::messages::{
    AssistantMessage, ContentBlock, Message, ResultMessage, StreamEvent, SystemMessage,
    UserContent, UserMessage,
};

/// Parse a JSON value into a typed Message
///
/// Dispatches on the top-level `type` field. Content arrays of `user` and
/// `assistant` messages are classified block by block; a block with an
/// unknown `type` or missing required fields is skipped rather than failing
/// the whole message.
///
/// # Errors
/// Returns `ClaudeError::MessageParse` when `type` is missing or unknown, or a
/// required field of the message itself is absent. The raw object is kept in
/// the error so callers can decide whether to treat it as fatal.
///
/// # Examples
/// ```
/// use claude_agent_protocol::{parse_message, Message};
/// use serde_json::json;
///
/// let msg = parse_message(json!({
///     "type": "assistant",
///     "message": {
///         "model": "claude-sonnet-4-5",
///         "content": [
///             {"type": "text", "text": "Hi"},
///             {"type": "hologram", "payload": 1}
///         ]
///     }
/// }))
/// .unwrap();
///
/// let Message::Assistant(assistant) = msg else { panic!("expected assistant") };
/// assert_eq!(assistant.content.len(), 1);
/// ```
pub fn parse_message(data: Value) -> Result<Message> {
    let Some(kind) = data.get("type").and_then(Value::as_str) else {
        return Err(ClaudeError::message_parse(
            "missing 'type' field",
            Some(data),
        ));
    };

    match kind {
        "user" => parse_user(data),
        "assistant" => parse_assistant(data),
        "system" => parse_system(data),
        "result" => from_value::<ResultMessage>(data, "result").map(Message::Result),
        "stream_event" => from_value::<StreamEvent>(data, "stream_event").map(Message::StreamEvent),
        other => {
            let message = format!("unknown message type: {other}");
            Err(ClaudeError::message_parse(message, Some(data)))
        }
    }
}

fn parse_user(data: Value) -> Result<Message> {
    let content = match data.get("message").and_then(|m| m.get("content")) {
        Some(Value::String(text)) => UserContent::String(text.clone()),
        Some(Value::Array(blocks)) => UserContent::Blocks(parse_content_blocks(blocks)),
        Some(_) => {
            return Err(ClaudeError::message_parse(
                "user message content must be a string or an array",
                Some(data),
            ));
        }
        None => {
            return Err(ClaudeError::message_parse(
                "user message missing 'message.content' field",
                Some(data),
            ));
        }
    };

    Ok(Message::User(UserMessage {
        content,
        parent_tool_use_id: string_field(&data, "parent_tool_use_id"),
        session_id: string_field(&data, "session_id").map(SessionId::new),
        uuid: string_field(&data, "uuid"),
    }))
}

fn parse_assistant(data: Value) -> Result<Message> {
    let Some(message) = data.get("message") else {
        return Err(ClaudeError::message_parse(
            "assistant message missing 'message' field",
            Some(data),
        ));
    };
    let Some(blocks) = message.get("content").and_then(Value::as_array) else {
        return Err(ClaudeError::message_parse(
            "assistant message missing 'message.content' array",
            Some(data),
        ));
    };

    let content = parse_content_blocks(blocks);
    let model = string_field(message, "model").unwrap_or_default();
    let error = string_field(&data, "error").or_else(|| string_field(message, "error"));

    Ok(Message::Assistant(AssistantMessage {
        model,
        content,
        error,
        parent_tool_use_id: string_field(&data, "parent_tool_use_id"),
        session_id: string_field(&data, "session_id").map(SessionId::new),
    }))
}

fn parse_system(data: Value) -> Result<Message> {
    let Some(subtype) = string_field(&data, "subtype") else {
        return Err(ClaudeError::message_parse(
            "system message missing 'subtype' field",
            Some(data),
        ));
    };
    Ok(Message::System(SystemMessage { subtype, data }))
}

/// Classify each block independently, dropping the ones we cannot read
fn parse_content_blocks(blocks: &[Value]) -> Vec<ContentBlock> {
    blocks
        .iter()
        .filter_map(|raw| match serde_json::from_value::<ContentBlock>(raw.clone()) {
            Ok(block) => Some(block),
            Err(e) => {
                log::debug!("Skipping unrecognized content block: {e}");
                None
            }
        })
        .collect()
}

fn from_value<T: DeserializeOwned>(data: Value, kind: &str) -> Result<T> {
    T::deserialize(&data).map_err(|e| {
        ClaudeError::message_parse(format!("invalid {kind} message: {e}"), Some(data))
    })
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
