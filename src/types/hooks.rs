//! Hook-related type definitions
//!
//! This module contains the hook events, the typed inputs the agent sends with
//! a `hook_callback` request, the outputs a callback may return, and the
//! callback and matcher types used to configure hooks.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::{ClaudeError, Result};

// ============================================================================
// Hook Events
// ============================================================================

/// Hook event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HookEvent {
    /// Before a tool is used
    PreToolUse,
    /// After a tool is used
    PostToolUse,
    /// When user submits a prompt
    UserPromptSubmit,
    /// When conversation stops
    Stop,
    /// When a subagent stops
    SubagentStop,
    /// Before compacting the conversation
    PreCompact,
}

impl HookEvent {
    /// Wire name of the event
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreToolUse => "PreToolUse",
            Self::PostToolUse => "PostToolUse",
            Self::UserPromptSubmit => "UserPromptSubmit",
            Self::Stop => "Stop",
            Self::SubagentStop => "SubagentStop",
            Self::PreCompact => "PreCompact",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HookEvent {
    type Err = ClaudeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PreToolUse" => Ok(Self::PreToolUse),
            "PostToolUse" => Ok(Self::PostToolUse),
            "UserPromptSubmit" => Ok(Self::UserPromptSubmit),
            "Stop" => Ok(Self::Stop),
            "SubagentStop" => Ok(Self::SubagentStop),
            "PreCompact" => Ok(Self::PreCompact),
            other => Err(ClaudeError::hook(format!("unknown hook event: {other}"))),
        }
    }
}

// ============================================================================
// Hook Inputs
// ============================================================================

/// Fields shared by every hook input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseHookInput {
    /// Session the hook fired in
    pub session_id: String,
    /// Path to the conversation transcript
    pub transcript_path: String,
    /// Working directory of the agent
    pub cwd: String,
    /// Permission mode in effect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_mode: Option<String>,
}

/// Input for [`HookEvent::PreToolUse`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreToolUseHookInput {
    /// Shared fields
    #[serde(flatten)]
    pub base: BaseHookInput,
    /// Tool about to run
    pub tool_name: String,
    /// Input the tool will receive
    pub tool_input: Value,
}

/// Input for [`HookEvent::PostToolUse`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostToolUseHookInput {
    /// Shared fields
    #[serde(flatten)]
    pub base: BaseHookInput,
    /// Tool that ran
    pub tool_name: String,
    /// Input the tool received
    pub tool_input: Value,
    /// What the tool returned
    pub tool_response: Value,
}

/// Input for [`HookEvent::UserPromptSubmit`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPromptSubmitHookInput {
    /// Shared fields
    #[serde(flatten)]
    pub base: BaseHookInput,
    /// Submitted prompt text
    pub prompt: String,
}

/// Input for [`HookEvent::Stop`] and [`HookEvent::SubagentStop`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopHookInput {
    /// Shared fields
    #[serde(flatten)]
    pub base: BaseHookInput,
    /// Whether a stop hook is already keeping the agent running
    pub stop_hook_active: bool,
}

/// Input for [`HookEvent::PreCompact`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreCompactHookInput {
    /// Shared fields
    #[serde(flatten)]
    pub base: BaseHookInput,
    /// `manual` or `auto`
    pub trigger: String,
    /// Instructions supplied with a manual compaction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
}

/// Typed input handed to a hook callback
#[derive(Debug, Clone, PartialEq)]
pub enum HookInput {
    /// Before a tool is used
    PreToolUse(PreToolUseHookInput),
    /// After a tool is used
    PostToolUse(PostToolUseHookInput),
    /// When user submits a prompt
    UserPromptSubmit(UserPromptSubmitHookInput),
    /// When conversation stops
    Stop(StopHookInput),
    /// When a subagent stops
    SubagentStop(StopHookInput),
    /// Before compacting the conversation
    PreCompact(PreCompactHookInput),
}

impl HookInput {
    /// Decode the `input` object of a `hook_callback` request
    ///
    /// The variant is chosen by its `hook_event_name` field.
    ///
    /// # Errors
    /// Returns `ClaudeError::Hook` if the event name is missing or unknown, and
    /// `ClaudeError::JsonDecode` if the fields do not fit the event.
    pub fn from_value(input: Value) -> Result<Self> {
        let event: HookEvent = input
            .get("hook_event_name")
            .and_then(Value::as_str)
            .ok_or_else(|| ClaudeError::hook("hook input missing 'hook_event_name'"))?
            .parse()?;

        Ok(match event {
            HookEvent::PreToolUse => Self::PreToolUse(serde_json::from_value(input)?),
            HookEvent::PostToolUse => Self::PostToolUse(serde_json::from_value(input)?),
            HookEvent::UserPromptSubmit => Self::UserPromptSubmit(serde_json::from_value(input)?),
            HookEvent::Stop => Self::Stop(serde_json::from_value(input)?),
            HookEvent::SubagentStop => Self::SubagentStop(serde_json::from_value(input)?),
            HookEvent::PreCompact => Self::PreCompact(serde_json::from_value(input)?),
        })
    }

    /// Event this input belongs to
    #[must_use]
    pub const fn event(&self) -> HookEvent {
        match self {
            Self::PreToolUse(_) => HookEvent::PreToolUse,
            Self::PostToolUse(_) => HookEvent::PostToolUse,
            Self::UserPromptSubmit(_) => HookEvent::UserPromptSubmit,
            Self::Stop(_) => HookEvent::Stop,
            Self::SubagentStop(_) => HookEvent::SubagentStop,
            Self::PreCompact(_) => HookEvent::PreCompact,
        }
    }

    /// Shared fields
    #[must_use]
    pub const fn base(&self) -> &BaseHookInput {
        match self {
            Self::PreToolUse(i) => &i.base,
            Self::PostToolUse(i) => &i.base,
            Self::UserPromptSubmit(i) => &i.base,
            Self::Stop(i) | Self::SubagentStop(i) => &i.base,
            Self::PreCompact(i) => &i.base,
        }
    }

    /// Tool name for tool events
    #[must_use]
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::PreToolUse(i) => Some(&i.tool_name),
            Self::PostToolUse(i) => Some(&i.tool_name),
            _ => None,
        }
    }
}

// ============================================================================
// Hook Outputs
// ============================================================================

/// Hook decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookDecision {
    /// Block the action
    Block,
}

/// Permission decision a `PreToolUse` hook can make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookPermissionDecision {
    /// Let the tool run
    Allow,
    /// Refuse the tool
    Deny,
    /// Fall back to asking
    Ask,
}

/// Event-specific output, tagged by `hookEventName`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "hookEventName")]
pub enum HookSpecificOutput {
    /// Output of a `PreToolUse` hook
    #[serde(rename_all = "camelCase")]
    PreToolUse {
        /// Permission decision
        #[serde(default, skip_serializing_if = "Option::is_none")]
        permission_decision: Option<HookPermissionDecision>,
        /// Reason shown for the decision
        #[serde(default, skip_serializing_if = "Option::is_none")]
        permission_decision_reason: Option<String>,
        /// Replacement tool input
        #[serde(default, skip_serializing_if = "Option::is_none")]
        updated_input: Option<Value>,
    },
    /// Output of a `PostToolUse` hook
    #[serde(rename_all = "camelCase")]
    PostToolUse {
        /// Context added to the conversation
        #[serde(default, skip_serializing_if = "Option::is_none")]
        additional_context: Option<String>,
    },
    /// Output of a `UserPromptSubmit` hook
    #[serde(rename_all = "camelCase")]
    UserPromptSubmit {
        /// Context added to the conversation
        #[serde(default, skip_serializing_if = "Option::is_none")]
        additional_context: Option<String>,
    },
}

/// Hook output
///
/// Every field is optional; the default value serializes to `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    /// Whether the agent should continue after the hook
    #[serde(rename = "continue", default, skip_serializing_if = "Option::is_none")]
    pub continue_: Option<bool>,
    /// Hide the hook's stdout from the transcript
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suppress_output: Option<bool>,
    /// Message shown when `continue` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    /// Decision to block or allow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<HookDecision>,
    /// System message to add
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    /// Reason given to the model for the decision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Run the hook asynchronously
    #[serde(rename = "async", default, skip_serializing_if = "Option::is_none")]
    pub async_: Option<bool>,
    /// Timeout in milliseconds for an asynchronous hook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub async_timeout: Option<u64>,
    /// Hook-specific output data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,
}

impl HookOutput {
    /// Output that blocks the action with a reason
    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            decision: Some(HookDecision::Block),
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Output that denies a pending tool use from a `PreToolUse` hook
    pub fn deny_tool(reason: impl Into<String>) -> Self {
        Self {
            hook_specific_output: Some(HookSpecificOutput::PreToolUse {
                permission_decision: Some(HookPermissionDecision::Deny),
                permission_decision_reason: Some(reason.into()),
                updated_input: None,
            }),
            ..Self::default()
        }
    }

    /// Output that adds context to the conversation
    ///
    /// Only `PostToolUse` and `UserPromptSubmit` accept additional context;
    /// other events get an empty output.
    pub fn additional_context(event: HookEvent, context: impl Into<String>) -> Self {
        let additional_context = Some(context.into());
        let hook_specific_output = match event {
            HookEvent::PostToolUse => Some(HookSpecificOutput::PostToolUse { additional_context }),
            HookEvent::UserPromptSubmit => {
                Some(HookSpecificOutput::UserPromptSubmit { additional_context })
            }
            _ => None,
        };
        Self {
            hook_specific_output,
            ..Self::default()
        }
    }
}

// ============================================================================
// Callbacks and Matchers
// ============================================================================

/// Context for hook callbacks
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    cancellation: CancellationToken,
}

impl HookContext {
    /// Context tied to a cancellation token
    #[must_use]
    pub const fn new(cancellation: CancellationToken) -> Self {
        Self { cancellation }
    }

    /// Whether the connection that issued the callback has closed
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once the connection that issued the callback closes
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }
}

/// Hook callback type
pub type HookCallback = Arc<
    dyn Fn(
            HookInput,
            Option<String>,
            HookContext,
        ) -> Pin<Box<dyn Future<Output = Result<HookOutput>> + Send>>
        + Send
        + Sync,
>;

/// Hook matcher configuration
#[derive(Clone)]
pub struct HookMatcher {
    /// Matcher pattern (e.g., tool name like "Bash" or pattern like "Write|Edit")
    ///
    /// Interpreted by the agent; sent verbatim.
    pub matcher: Option<String>,
    /// List of hook callbacks
    pub hooks: Vec<HookCallback>,
    /// Timeout in seconds for the hooks of this matcher
    pub timeout: Option<f64>,
}

impl fmt::Debug for HookMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookMatcher")
            .field("matcher", &self.matcher)
            .field("hooks", &format!("[{} callbacks]", self.hooks.len()))
            .field("timeout", &self.timeout)
            .finish()
    }
}
