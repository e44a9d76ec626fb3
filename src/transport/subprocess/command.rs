//! CLI argument construction

use std::path::Path;

use serde_json::{Map, Value};
use tokio::process::Command;

use crate::types::agent::SystemPrompt;
use crate::types::mcp::McpServers;
use crate::types::options::ClaudeAgentOptions;
use crate::types::permissions::SettingSource;

use super::config::{ALLOWED_EXTRA_FLAGS, PromptInput};

/// Builds the CLI invocation from options and prompt mode
pub(super) struct CommandBuilder<'a> {
    cli_path: &'a Path,
    prompt: &'a PromptInput,
    options: &'a ClaudeAgentOptions,
}

impl<'a> CommandBuilder<'a> {
    pub(super) const fn new(
        cli_path: &'a Path,
        prompt: &'a PromptInput,
        options: &'a ClaudeAgentOptions,
    ) -> Self {
        Self {
            cli_path,
            prompt,
            options,
        }
    }

    pub(super) fn build(&self) -> Command {
        let mut cmd = Command::new(self.cli_path);
        cmd.args(self.args());
        cmd
    }

    /// Arguments after the program name
    ///
    /// The prompt mode goes last: `--input-format stream-json` for streaming,
    /// `--print -- <prompt>` for one-shot.
    pub(super) fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
        ];

        match &self.options.system_prompt {
            None => push_pair(&mut args, "--system-prompt", ""),
            Some(SystemPrompt::String(prompt)) => push_pair(&mut args, "--system-prompt", prompt),
            Some(SystemPrompt::Preset(preset)) => {
                if let Some(append) = &preset.append {
                    push_pair(&mut args, "--append-system-prompt", append);
                }
            }
        }

        self.add_tool_args(&mut args);
        self.add_configuration_args(&mut args);
        self.add_session_args(&mut args);
        self.add_mcp_args(&mut args);
        self.add_extra_args(&mut args);

        match self.prompt {
            PromptInput::Stream => push_pair(&mut args, "--input-format", "stream-json"),
            PromptInput::String(prompt) => {
                args.push("--print".to_string());
                args.push("--".to_string());
                args.push(prompt.clone());
            }
        }

        args
    }

    fn add_tool_args(&self, args: &mut Vec<String>) {
        if !self.options.allowed_tools.is_empty() {
            let tools: Vec<&str> = self.options.allowed_tools.iter().map(|t| t.as_str()).collect();
            push_pair(args, "--allowedTools", &tools.join(","));
        }

        if let Some(max_turns) = self.options.max_turns {
            push_pair(args, "--max-turns", &max_turns.to_string());
        }

        if !self.options.disallowed_tools.is_empty() {
            let tools: Vec<&str> = self
                .options
                .disallowed_tools
                .iter()
                .map(|t| t.as_str())
                .collect();
            push_pair(args, "--disallowedTools", &tools.join(","));
        }
    }

    fn add_configuration_args(&self, args: &mut Vec<String>) {
        if let Some(model) = &self.options.model {
            push_pair(args, "--model", model);
        }

        if let Some(tool) = self.options.effective_permission_prompt_tool() {
            push_pair(args, "--permission-prompt-tool", tool);
        }

        if let Some(mode) = self.options.permission_mode {
            push_pair(args, "--permission-mode", mode.as_str());
        }

        if let Some(format) = &self.options.output_format {
            match (format.get("type").and_then(Value::as_str), format.get("schema")) {
                (Some("json_schema"), Some(schema)) => {
                    push_pair(args, "--json-schema", &schema.to_string());
                }
                _ => log::warn!("Ignoring output_format without a json_schema type and schema"),
            }
        }
    }

    fn add_session_args(&self, args: &mut Vec<String>) {
        if self.options.continue_conversation {
            args.push("--continue".to_string());
        }

        if let Some(session_id) = &self.options.resume {
            push_pair(args, "--resume", session_id.as_str());
        }

        if let Some(settings) = &self.options.settings {
            push_pair(args, "--settings", settings);
        }

        for dir in &self.options.add_dirs {
            push_pair(args, "--add-dir", &dir.to_string_lossy());
        }
    }

    fn add_mcp_args(&self, args: &mut Vec<String>) {
        match &self.options.mcp_servers {
            McpServers::Dict(servers) if !servers.is_empty() => {
                let servers: Map<String, Value> = servers
                    .iter()
                    .map(|(name, config)| (name.clone(), config.to_cli_value()))
                    .collect();
                let config = serde_json::json!({ "mcpServers": servers });
                push_pair(args, "--mcp-config", &config.to_string());
            }
            McpServers::Path(path) => push_pair(args, "--mcp-config", &path.to_string_lossy()),
            McpServers::Dict(_) | McpServers::None => {}
        }

        if self.options.include_partial_messages {
            args.push("--include-partial-messages".to_string());
        }

        if self.options.fork_session {
            args.push("--fork-session".to_string());
        }

        if let Some(agents) = &self.options.agents
            && !agents.is_empty()
        {
            match serde_json::to_string(agents) {
                Ok(json) => push_pair(args, "--agents", &json),
                Err(e) => log::warn!("Skipping --agents: {e}"),
            }
        }
    }

    fn add_extra_args(&self, args: &mut Vec<String>) {
        let sources = self
            .options
            .setting_sources
            .as_ref()
            .map(|sources| {
                sources
                    .iter()
                    .map(|s| match s {
                        SettingSource::User => "user",
                        SettingSource::Project => "project",
                        SettingSource::Local => "local",
                    })
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();
        push_pair(args, "--setting-sources", &sources);

        let mut extra: Vec<_> = self.options.extra_args.iter().collect();
        extra.sort_by(|a, b| a.0.cmp(b.0));
        for (flag, value) in extra {
            if !ALLOWED_EXTRA_FLAGS.contains(&flag.as_str()) {
                log::warn!("Ignoring extra CLI flag not on the allowlist: --{flag}");
                continue;
            }
            args.push(format!("--{flag}"));
            if let Some(value) = value {
                args.push(value.clone());
            }
        }
    }
}

fn push_pair(args: &mut Vec<String>, flag: &str, value: &str) {
    args.push(flag.to_string());
    args.push(value.to_string());
}
