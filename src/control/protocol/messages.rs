//! Control envelopes as they appear on the wire
//!
//! Outbound requests are typed ([`OutboundRequest`]). Inbound request bodies
//! stay raw [`Value`]s until the dispatcher picks a handler by subtype.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::identifiers::RequestId;
use crate::types::permissions::PermissionMode;

/// Control envelope, discriminated by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// A request; sent by either side
    ControlRequest {
        /// Correlation id chosen by the sender
        request_id: RequestId,
        /// Request body, carrying a `subtype`
        request: Value,
    },
    /// Answer to an earlier request
    ControlResponse {
        /// Response body
        response: ControlResponse,
    },
    /// Remote asks to abandon one of its requests
    ControlCancelRequest {
        /// Request being cancelled
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
    },
}

impl ControlMessage {
    /// Wrap an outbound request under `request_id`
    ///
    /// # Errors
    /// Returns error if the request body cannot be serialized
    pub fn request(request_id: RequestId, request: &OutboundRequest) -> serde_json::Result<Self> {
        Ok(Self::ControlRequest {
            request_id,
            request: serde_json::to_value(request)?,
        })
    }

    /// Wrap a response body
    #[must_use]
    pub const fn response(response: ControlResponse) -> Self {
        Self::ControlResponse { response }
    }
}

/// Body of a `control_response`, discriminated by `subtype`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum ControlResponse {
    /// The request succeeded
    Success {
        /// Id of the request being answered
        request_id: RequestId,
        /// Result payload
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response: Option<Value>,
    },
    /// The request failed
    Error {
        /// Id of the request being answered
        request_id: RequestId,
        /// Human-readable failure
        #[serde(default)]
        error: String,
    },
}

impl ControlResponse {
    /// Successful answer carrying `payload`
    #[must_use]
    pub const fn success(request_id: RequestId, payload: Value) -> Self {
        Self::Success {
            request_id,
            response: Some(payload),
        }
    }

    /// Failed answer
    pub fn error(request_id: RequestId, error: impl Into<String>) -> Self {
        Self::Error {
            request_id,
            error: error.into(),
        }
    }

    /// Correlation id
    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        match self {
            Self::Success { request_id, .. } | Self::Error { request_id, .. } => request_id,
        }
    }
}

/// What is still usable in a control envelope that failed to decode
#[derive(Debug, Clone, PartialEq)]
pub enum Salvaged {
    /// A response with an id; any subtype other than `error` counts as success
    Response(ControlResponse),
    /// A request that cannot be dispatched but can still be answered
    Reject {
        /// Id to answer
        request_id: RequestId,
        /// Text for the error response
        reason: String,
    },
}

impl Salvaged {
    /// Recover from `raw`, which failed to decode as a [`ControlMessage`] with `error`
    ///
    /// Returns `None` when no request id can be found.
    #[must_use]
    pub fn from_envelope(raw: &Value, error: &serde_json::Error) -> Option<Self> {
        match raw.get("type").and_then(Value::as_str)? {
            "control_response" => {
                let body = raw.get("response")?;
                let request_id = body.get("request_id").and_then(id_of)?;
                let response = if body.get("subtype").and_then(Value::as_str) == Some("error") {
                    let error = match body.get("error") {
                        Some(Value::String(text)) => text.clone(),
                        Some(other) => other.to_string(),
                        None => String::new(),
                    };
                    ControlResponse::error(request_id, error)
                } else {
                    ControlResponse::Success {
                        request_id,
                        response: body.get("response").filter(|v| !v.is_null()).cloned(),
                    }
                };
                Some(Self::Response(response))
            }
            "control_request" => Some(Self::Reject {
                request_id: raw.get("request_id").and_then(id_of)?,
                reason: format!("malformed control request: {error}"),
            }),
            _ => None,
        }
    }
}

fn id_of(value: &Value) -> Option<RequestId> {
    match value {
        Value::String(id) => Some(RequestId::new(id.as_str())),
        Value::Number(n) => Some(RequestId::new(n.to_string())),
        _ => None,
    }
}

/// Requests this side sends to the agent
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "subtype", rename_all = "snake_case")]
pub enum OutboundRequest {
    /// Handshake carrying the hook table
    Initialize {
        /// `{event: [{matcher, hookCallbackIds, timeout?}]}`
        #[serde(skip_serializing_if = "Option::is_none")]
        hooks: Option<Value>,
    },
    /// Stop the current run
    Interrupt,
    /// Change how tool use is approved
    SetPermissionMode {
        /// New mode
        mode: PermissionMode,
    },
    /// Switch models; `None` restores the default
    SetModel {
        /// Model name
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
}

impl OutboundRequest {
    /// Wire subtype
    #[must_use]
    pub const fn subtype(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::Interrupt => "interrupt",
            Self::SetPermissionMode { .. } => "set_permission_mode",
            Self::SetModel { .. } => "set_model",
        }
    }
}
