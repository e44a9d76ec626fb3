//! System prompt and subagent definition types
//!
//! Both only shape the CLI invocation; the protocol engine never reads them.

use serde::{Deserialize, Serialize};

/// System prompt preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPromptPreset {
    /// Prompt type (always "preset")
    #[serde(rename = "type")]
    pub prompt_type: String,
    /// Preset name (e.g., "`claude_code`")
    pub preset: String,
    /// Additional text to append to the preset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append: Option<String>,
}

impl SystemPromptPreset {
    /// The agent's built-in prompt with extra text appended
    pub fn claude_code_with(append: impl Into<String>) -> Self {
        Self {
            prompt_type: "preset".to_string(),
            preset: "claude_code".to_string(),
            append: Some(append.into()),
        }
    }
}

/// System prompt configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemPrompt {
    /// Replace the system prompt entirely
    String(String),
    /// Keep a preset, optionally appending to it
    Preset(SystemPromptPreset),
}

impl From<String> for SystemPrompt {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for SystemPrompt {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<SystemPromptPreset> for SystemPrompt {
    fn from(preset: SystemPromptPreset) -> Self {
        Self::Preset(preset)
    }
}

/// Subagent definition passed to the CLI with `--agents`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Agent description
    pub description: String,
    /// Agent system prompt
    pub prompt: String,
    /// Tools available to the agent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    /// Model to use for the agent (`sonnet`, `opus`, `haiku`, `inherit`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
