//! Control protocol: wire envelopes, request correlation and inbound dispatch

pub mod dispatcher;
pub mod protocol;

pub use dispatcher::{
    Dispatcher, HookCallbackRequest, InboundRequest, McpMessageRequest, PermissionCheckRequest,
};
pub use protocol::{ControlMessage, ControlResponse, OutboundRequest, ProtocolHandler, Salvaged};
