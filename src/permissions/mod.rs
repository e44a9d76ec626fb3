//! Permission callbacks and their wire encoding

use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::types::identifiers::ToolName;
use crate::types::permissions::{CanUseToolCallback, PermissionResult, ToolPermissionContext};

/// Helpers for building permission callbacks
pub struct PermissionManager;

impl PermissionManager {
    /// Create a permission callback from an async closure
    ///
    /// # Example
    ///
    /// ```rust
    /// use claude_agent_protocol::permissions::PermissionManager;
    /// use claude_agent_protocol::types::PermissionResult;
    ///
    /// let can_use_tool = PermissionManager::callback(|tool, _input, _ctx| async move {
    ///     if tool.as_str() == "Bash" {
    ///         Ok(PermissionResult::deny("shell is disabled"))
    ///     } else {
    ///         Ok(PermissionResult::allow())
    ///     }
    /// });
    /// ```
    pub fn callback<F, Fut>(f: F) -> CanUseToolCallback
    where
        F: Fn(ToolName, Value, ToolPermissionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<PermissionResult>> + Send + 'static,
    {
        Arc::new(move |tool, input, context| Box::pin(f(tool, input, context)))
    }
}

/// Encode a decision as the body of a `can_use_tool` response
///
/// An allow always carries `updatedInput`: the replacement if one was given,
/// otherwise `original_input` unchanged. A deny carries its message, and
/// `interrupt: true` only when set.
#[must_use]
pub fn permission_response(result: PermissionResult, original_input: Value) -> Value {
    let mut body = Map::new();
    match result {
        PermissionResult::Allow(allow) => {
            body.insert("behavior".into(), "allow".into());
            body.insert(
                "updatedInput".into(),
                allow.updated_input.unwrap_or(original_input),
            );
            if let Some(updates) = allow.updated_permissions {
                body.insert(
                    "updatedPermissions".into(),
                    serde_json::to_value(updates).unwrap_or_default(),
                );
            }
        }
        PermissionResult::Deny(deny) => {
            body.insert("behavior".into(), "deny".into());
            body.insert("message".into(), deny.message.into());
            if deny.interrupt {
                body.insert("interrupt".into(), true.into());
            }
        }
    }
    Value::Object(body)
}
