//! Type definitions for the SDK
//!
//! - [`identifiers`] - Type-safe ID wrappers (`SessionId`, `ToolName`, `RequestId`, `CallbackId`)
//! - [`permissions`] - Permission modes, updates, decisions and callbacks
//! - [`hooks`] - Hook events, typed inputs, outputs and callbacks
//! - [`mcp`] - MCP server configuration
//! - [`messages`] - Message and content block types
//! - [`agent`] - Agent definitions and system prompts
//! - [`options`] - Main configuration options

pub mod agent;
pub mod hooks;
pub mod identifiers;
pub mod mcp;
pub mod messages;
pub mod options;
pub mod permissions;

pub use identifiers::{CallbackId, RequestId, SessionId, ToolName};
pub use permissions::{
    CanUseToolCallback, PermissionBehavior, PermissionMode, PermissionResult,
    PermissionResultAllow, PermissionResultDeny, PermissionRuleValue, PermissionUpdate,
    PermissionUpdateDestination, SettingSource, ToolPermissionContext,
};
