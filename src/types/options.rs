//! Agent options and configuration
//!
//! [`ClaudeAgentOptions`] carries two kinds of settings: the ones the protocol
//! engine reads (callbacks, SDK servers, buffer and channel sizes, timeouts)
//! and the ones only the subprocess transport turns into CLI flags.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::agent::{AgentDefinition, SystemPrompt};
use super::hooks::{HookEvent, HookMatcher};
use super::identifiers::{SessionId, ToolName};
use super::mcp::{McpServerConfig, McpServers};
use super::permissions::{CanUseToolCallback, PermissionMode, SettingSource};
use crate::error::{ClaudeError, Result};

/// Default maximum size of one buffered JSON object (1MB)
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Default time to wait for the initialize handshake
pub const DEFAULT_INITIALIZE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default bound of the consumer message channel
pub const DEFAULT_MESSAGE_CHANNEL_CAPACITY: usize = 100;

/// Callback receiving each line the CLI writes to stderr
pub type StderrCallback = Arc<dyn Fn(&str) + Send + Sync>;

// ============================================================================
// Claude Agent Options
// ============================================================================

/// Main options for the SDK
#[derive(Clone, Default)]
pub struct ClaudeAgentOptions {
    /// List of tools that Claude is allowed to use
    pub allowed_tools: Vec<ToolName>,
    /// List of tools that Claude is not allowed to use
    pub disallowed_tools: Vec<ToolName>,
    /// System prompt configuration
    pub system_prompt: Option<SystemPrompt>,
    /// MCP server configurations
    pub mcp_servers: McpServers,
    /// Permission mode for tool execution
    pub permission_mode: Option<PermissionMode>,
    /// Whether to continue from the previous conversation
    pub continue_conversation: bool,
    /// Session ID to resume from
    pub resume: Option<SessionId>,
    /// Fork the resumed session into a new one
    pub fork_session: bool,
    /// Maximum number of turns before stopping
    pub max_turns: Option<u32>,
    /// AI model to use
    pub model: Option<String>,
    /// Tool name to use for permission prompts
    pub permission_prompt_tool_name: Option<String>,
    /// Working directory for the CLI process
    pub cwd: Option<PathBuf>,
    /// Explicit path to the CLI binary
    pub cli_path: Option<PathBuf>,
    /// Additional directories to add to the context
    pub add_dirs: Vec<PathBuf>,
    /// Environment variables for the CLI process
    pub env: HashMap<String, String>,
    /// Extra CLI arguments to pass (allowlisted flags only)
    pub extra_args: HashMap<String, Option<String>>,
    /// Whether to include partial messages in stream
    pub include_partial_messages: bool,
    /// Custom agent definitions
    pub agents: Option<HashMap<String, AgentDefinition>>,
    /// Setting sources to load
    pub setting_sources: Option<Vec<SettingSource>>,
    /// Settings file path or inline JSON
    pub settings: Option<String>,
    /// Structured output request, e.g. `{"type": "json_schema", "schema": {..}}`
    ///
    /// The validated value arrives in [`ResultMessage::structured_output`](crate::types::messages::ResultMessage::structured_output).
    pub output_format: Option<serde_json::Value>,
    /// Maximum buffer size for one JSON message (default: 1MB)
    pub max_buffer_size: Option<usize>,
    /// Callback for tool permission checks
    pub can_use_tool: Option<CanUseToolCallback>,
    /// Hook configurations
    pub hooks: Option<HashMap<HookEvent, Vec<HookMatcher>>>,
    /// Time to wait for the initialize handshake (default: 60s)
    pub initialize_timeout: Option<Duration>,
    /// Bound of the consumer message channel (default: 100)
    pub message_channel_capacity: Option<usize>,
    /// Cap on concurrently running inbound control requests (default: none)
    pub max_concurrent_control_requests: Option<usize>,
    /// Receives CLI stderr line by line
    pub stderr: Option<StderrCallback>,
}

impl ClaudeAgentOptions {
    /// Create a new builder for `ClaudeAgentOptions`
    #[must_use]
    pub fn builder() -> ClaudeAgentOptionsBuilder {
        ClaudeAgentOptionsBuilder::default()
    }

    /// Check option combinations that cannot work together
    ///
    /// # Errors
    /// Returns `ClaudeError::InvalidConfig` when `can_use_tool` and
    /// `permission_prompt_tool_name` are both set, or a size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.can_use_tool.is_some() && self.permission_prompt_tool_name.is_some() {
            return Err(ClaudeError::invalid_config(
                "can_use_tool callback cannot be used with permission_prompt_tool_name",
            ));
        }
        if self.max_buffer_size == Some(0) {
            return Err(ClaudeError::invalid_config("max_buffer_size must be positive"));
        }
        if self.message_channel_capacity == Some(0) {
            return Err(ClaudeError::invalid_config(
                "message_channel_capacity must be positive",
            ));
        }
        if self.max_concurrent_control_requests == Some(0) {
            return Err(ClaudeError::invalid_config(
                "max_concurrent_control_requests must be positive",
            ));
        }
        Ok(())
    }

    /// Permission prompt tool the CLI should use
    ///
    /// With a `can_use_tool` callback this is `stdio`, which routes permission
    /// checks back over the control protocol.
    #[must_use]
    pub fn effective_permission_prompt_tool(&self) -> Option<&str> {
        if self.can_use_tool.is_some() {
            Some("stdio")
        } else {
            self.permission_prompt_tool_name.as_deref()
        }
    }

    /// Framer limit in effect
    #[must_use]
    pub fn effective_max_buffer_size(&self) -> usize {
        self.max_buffer_size.unwrap_or(DEFAULT_MAX_BUFFER_SIZE)
    }

    /// Initialize timeout in effect
    #[must_use]
    pub fn effective_initialize_timeout(&self) -> Duration {
        self.initialize_timeout.unwrap_or(DEFAULT_INITIALIZE_TIMEOUT)
    }

    /// Consumer channel bound in effect
    #[must_use]
    pub fn effective_message_channel_capacity(&self) -> usize {
        self.message_channel_capacity
            .unwrap_or(DEFAULT_MESSAGE_CHANNEL_CAPACITY)
    }
}

impl fmt::Debug for ClaudeAgentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaudeAgentOptions")
            .field("allowed_tools", &self.allowed_tools)
            .field("disallowed_tools", &self.disallowed_tools)
            .field("system_prompt", &self.system_prompt)
            .field("mcp_servers", &self.mcp_servers)
            .field("permission_mode", &self.permission_mode)
            .field("continue_conversation", &self.continue_conversation)
            .field("resume", &self.resume)
            .field("fork_session", &self.fork_session)
            .field("max_turns", &self.max_turns)
            .field("model", &self.model)
            .field(
                "permission_prompt_tool_name",
                &self.permission_prompt_tool_name,
            )
            .field("cwd", &self.cwd)
            .field("cli_path", &self.cli_path)
            .field("add_dirs", &self.add_dirs)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("extra_args", &self.extra_args)
            .field("include_partial_messages", &self.include_partial_messages)
            .field("agents", &self.agents)
            .field("setting_sources", &self.setting_sources)
            .field("settings", &self.settings)
            .field("output_format", &self.output_format)
            .field("max_buffer_size", &self.max_buffer_size)
            .field(
                "can_use_tool",
                &self.can_use_tool.as_ref().map(|_| "<callback>"),
            )
            .field(
                "hooks",
                &self
                    .hooks
                    .as_ref()
                    .map(|h| format!("[{} hook types]", h.len())),
            )
            .field("initialize_timeout", &self.initialize_timeout)
            .field("message_channel_capacity", &self.message_channel_capacity)
            .field(
                "max_concurrent_control_requests",
                &self.max_concurrent_control_requests,
            )
            .field("stderr", &self.stderr.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

// ============================================================================
// Builder for ClaudeAgentOptions
// ============================================================================

/// Builder for `ClaudeAgentOptions`
#[derive(Debug, Default)]
pub struct ClaudeAgentOptionsBuilder {
    options: ClaudeAgentOptions,
}

impl ClaudeAgentOptionsBuilder {
    /// Set allowed tools
    #[must_use]
    pub fn allowed_tools(mut self, tools: Vec<impl Into<ToolName>>) -> Self {
        self.options.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Add an allowed tool
    #[must_use]
    pub fn add_allowed_tool(mut self, tool: impl Into<ToolName>) -> Self {
        self.options.allowed_tools.push(tool.into());
        self
    }

    /// Set disallowed tools
    #[must_use]
    pub fn disallowed_tools(mut self, tools: Vec<impl Into<ToolName>>) -> Self {
        self.options.disallowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Set system prompt
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<SystemPrompt>) -> Self {
        self.options.system_prompt = Some(prompt.into());
        self
    }

    /// Set MCP servers
    #[must_use]
    pub fn mcp_servers(mut self, servers: HashMap<String, McpServerConfig>) -> Self {
        self.options.mcp_servers = McpServers::Dict(servers);
        self
    }

    /// Add one MCP server under `name`
    #[must_use]
    pub fn add_mcp_server(
        mut self,
        name: impl Into<String>,
        server: impl Into<McpServerConfig>,
    ) -> Self {
        let mut servers = match std::mem::take(&mut self.options.mcp_servers) {
            McpServers::Dict(servers) => servers,
            McpServers::None | McpServers::Path(_) => HashMap::new(),
        };
        servers.insert(name.into(), server.into());
        self.options.mcp_servers = McpServers::Dict(servers);
        self
    }

    /// Set permission mode
    #[must_use]
    pub const fn permission_mode(mut self, mode: PermissionMode) -> Self {
        self.options.permission_mode = Some(mode);
        self
    }

    /// Resume an earlier session
    #[must_use]
    pub fn resume(mut self, session: impl Into<SessionId>) -> Self {
        self.options.resume = Some(session.into());
        self
    }

    /// Set max turns, clamped to 1000
    #[must_use]
    pub fn max_turns(mut self, turns: u32) -> Self {
        const MAX_ALLOWED_TURNS: u32 = 1000;
        if turns > MAX_ALLOWED_TURNS {
            log::warn!("max_turns {turns} exceeds {MAX_ALLOWED_TURNS}; clamping");
        }
        self.options.max_turns = Some(turns.min(MAX_ALLOWED_TURNS));
        self
    }

    /// Fork instead of continuing when resuming
    #[must_use]
    pub const fn fork_session(mut self, fork: bool) -> Self {
        self.options.fork_session = fork;
        self
    }

    /// Path or JSON text passed with `--settings`
    #[must_use]
    pub fn settings(mut self, settings: impl Into<String>) -> Self {
        self.options.settings = Some(settings.into());
        self
    }

    /// Set setting sources to load
    #[must_use]
    pub fn setting_sources(mut self, sources: Vec<SettingSource>) -> Self {
        self.options.setting_sources = Some(sources);
        self
    }

    /// Continue the most recent conversation
    #[must_use]
    pub const fn continue_conversation(mut self, resume: bool) -> Self {
        self.options.continue_conversation = resume;
        self
    }

    /// Add an extra allowlisted CLI flag
    #[must_use]
    pub fn extra_arg(mut self, flag: impl Into<String>, value: Option<String>) -> Self {
        self.options.extra_args.insert(flag.into(), value);
        self
    }

    /// Add a directory to the agent's context
    #[must_use]
    pub fn add_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.add_dirs.push(path.into());
        self
    }

    /// Define a subagent
    #[must_use]
    pub fn agent(mut self, name: impl Into<String>, agent: AgentDefinition) -> Self {
        self.options
            .agents
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), agent);
        self
    }

    /// Set model
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = Some(model.into());
        self
    }

    /// Name an MCP tool the CLI asks for permission decisions
    ///
    /// Cannot be combined with [`can_use_tool`](Self::can_use_tool).
    #[must_use]
    pub fn permission_prompt_tool_name(mut self, tool: impl Into<String>) -> Self {
        self.options.permission_prompt_tool_name = Some(tool.into());
        self
    }

    /// Set working directory
    #[must_use]
    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(path.into());
        self
    }

    /// Set the CLI binary path
    #[must_use]
    pub fn cli_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.cli_path = Some(path.into());
        self
    }

    /// Add an environment variable for the CLI process
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), value.into());
        self
    }

    /// Stream partial messages as `stream_event`s
    #[must_use]
    pub const fn include_partial_messages(mut self, include: bool) -> Self {
        self.options.include_partial_messages = include;
        self
    }

    /// Set `can_use_tool` callback
    #[must_use]
    pub fn can_use_tool(mut self, callback: CanUseToolCallback) -> Self {
        self.options.can_use_tool = Some(callback);
        self
    }

    /// Set hooks
    #[must_use]
    pub fn hooks(mut self, hooks: HashMap<HookEvent, Vec<HookMatcher>>) -> Self {
        self.options.hooks = Some(hooks);
        self
    }

    /// Add one hook matcher for `event`
    #[must_use]
    pub fn add_hook(mut self, event: HookEvent, matcher: HookMatcher) -> Self {
        self.options
            .hooks
            .get_or_insert_with(HashMap::new)
            .entry(event)
            .or_default()
            .push(matcher);
        self
    }

    /// Set the framer buffer limit in bytes
    #[must_use]
    pub const fn max_buffer_size(mut self, bytes: usize) -> Self {
        self.options.max_buffer_size = Some(bytes);
        self
    }

    /// Set the initialize handshake timeout
    #[must_use]
    pub const fn initialize_timeout(mut self, timeout: Duration) -> Self {
        self.options.initialize_timeout = Some(timeout);
        self
    }

    /// Set the consumer channel bound
    #[must_use]
    pub const fn message_channel_capacity(mut self, capacity: usize) -> Self {
        self.options.message_channel_capacity = Some(capacity);
        self
    }

    /// Request structured output in the given format
    #[must_use]
    pub fn output_format(mut self, format: serde_json::Value) -> Self {
        self.options.output_format = Some(format);
        self
    }

    /// Request structured output matching the JSON schema of `T`
    #[must_use]
    pub fn output_schema<T: schemars::JsonSchema>(self) -> Self {
        let schema = schemars::schema_for!(T).to_value();
        self.output_format(serde_json::json!({"type": "json_schema", "schema": schema}))
    }

    /// Cap concurrently running inbound control requests
    #[must_use]
    pub const fn max_concurrent_control_requests(mut self, limit: usize) -> Self {
        self.options.max_concurrent_control_requests = Some(limit);
        self
    }

    /// Receive CLI stderr line by line
    #[must_use]
    pub fn stderr(mut self, callback: StderrCallback) -> Self {
        self.options.stderr = Some(callback);
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> ClaudeAgentOptions {
        self.options
    }
}
