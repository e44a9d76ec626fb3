//! Control protocol envelopes and request correlation
//!
//! # Example
//!
//! ```rust
//! use claude_agent_protocol::control::{ControlMessage, ControlResponse, OutboundRequest, ProtocolHandler};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = ProtocolHandler::new();
//! let id = handler.next_id();
//! let mut rx = handler.register(id.clone(), "interrupt")?;
//!
//! let line = handler.serialize_message(&ControlMessage::request(id.clone(), &OutboundRequest::Interrupt)?)?;
//! assert!(line.ends_with('\n'));
//!
//! assert!(handler.handle_response(ControlResponse::success(id, serde_json::json!({}))));
//! assert!(rx.try_recv()?.is_ok());
//! # Ok(())
//! # }
//! ```

mod handler;
mod messages;

pub(crate) use handler::PendingGuard;
pub use handler::ProtocolHandler;
pub use messages::{ControlMessage, ControlResponse, OutboundRequest, Salvaged};
