//! Newtype wrappers for identifiers that cross the wire
//!
//! Each wrapper serializes as a bare string so it can sit directly inside
//! protocol envelopes, while keeping session ids, tool names, request ids and
//! hook callback ids from being mixed up in Rust code.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a string
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Unwrap into the underlying string
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Conversation session identifier
    SessionId
);

string_id!(
    /// Name of a tool as the agent knows it
    ToolName
);

string_id!(
    /// Correlation id of a control request
    RequestId
);

string_id!(
    /// Opaque id handed to the remote side in place of a hook callback
    CallbackId
);

impl Default for SessionId {
    fn default() -> Self {
        Self("default".to_string())
    }
}
