//! Message classification
//!
//! Turns decoded JSON objects into typed [`Message`](crate::types::messages::Message)
//! values. Control envelopes never reach this module; the connection's reader
//! loop routes them before classification.

mod parser;

pub use parser::parse_message;
