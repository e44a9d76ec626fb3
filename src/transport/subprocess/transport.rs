//! Subprocess transport state and `Transport` impl

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::error::{ClaudeError, Result};
use crate::transport::Transport;
use crate::types::options::ClaudeAgentOptions;

use super::command::CommandBuilder;
use super::config::PromptInput;

/// Transport that runs the agent CLI as a child process
pub struct SubprocessTransport {
    pub(super) prompt: PromptInput,
    pub(super) options: ClaudeAgentOptions,
    pub(super) cli_path: PathBuf,
    pub(super) process: Arc<Mutex<Option<Child>>>,
    pub(super) stdin: Option<ChildStdin>,
    pub(super) stdout: Option<ChildStdout>,
    pub(super) ready: AtomicBool,
    pub(super) max_buffer_size: usize,
    pub(super) reader_task: Option<JoinHandle<()>>,
    pub(super) stderr_task: Option<JoinHandle<()>>,
}

impl SubprocessTransport {
    /// Create a transport; the process starts on `connect`
    ///
    /// Uses `options.cli_path` when set, otherwise searches for the CLI.
    ///
    /// # Errors
    /// Returns `ClaudeError::CliNotFound` if no CLI binary can be located
    pub fn new(prompt: PromptInput, options: ClaudeAgentOptions) -> Result<Self> {
        let cli_path = match &options.cli_path {
            Some(path) => path.clone(),
            None => Self::find_cli()?,
        };
        let max_buffer_size = options.effective_max_buffer_size();

        Ok(Self {
            prompt,
            options,
            cli_path,
            process: Arc::new(Mutex::new(None)),
            stdin: None,
            stdout: None,
            ready: AtomicBool::new(false),
            max_buffer_size,
            reader_task: None,
            stderr_task: None,
        })
    }

    /// Find the CLI binary
    ///
    /// # Errors
    /// Returns error if the CLI is neither on `PATH` nor in a common location
    pub fn find_cli() -> Result<PathBuf> {
        if let Ok(path) = which::which("claude") {
            return Ok(path);
        }

        let home = PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/root")));
        let locations = [
            home.join(".npm-global/bin/claude"),
            PathBuf::from("/usr/local/bin/claude"),
            home.join(".local/bin/claude"),
            home.join("node_modules/.bin/claude"),
            home.join(".yarn/bin/claude"),
            home.join(".claude/local/claude"),
        ];

        locations
            .into_iter()
            .find(|path| path.is_file())
            .ok_or_else(ClaudeError::cli_not_found)
    }

    /// Path of the CLI this transport runs
    #[must_use]
    pub fn cli_path(&self) -> &Path {
        &self.cli_path
    }

    /// Arguments the CLI is started with
    #[must_use]
    pub fn cli_args(&self) -> Vec<String> {
        CommandBuilder::new(&self.cli_path, &self.prompt, &self.options).args()
    }
}

impl Transport for SubprocessTransport {
    async fn connect(&mut self) -> Result<()> {
        self.connect_impl().await
    }

    async fn write(&mut self, data: &str) -> Result<()> {
        if !self.is_ready() {
            return Err(ClaudeError::transport("Transport is not ready for writing"));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ClaudeError::transport("stdin not available"))?;

        stdin
            .write_all(data.as_bytes())
            .await
            .map_err(|e| ClaudeError::transport(format!("Failed to write to stdin: {e}")))?;

        stdin
            .flush()
            .await
            .map_err(|e| ClaudeError::transport(format!("Failed to flush stdin: {e}")))
    }

    async fn end_input(&mut self) -> Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin
                .shutdown()
                .await
                .map_err(|e| ClaudeError::transport(format!("Failed to close stdin: {e}")))?;
        }
        Ok(())
    }

    fn read_messages(&mut self) -> mpsc::Receiver<Result<serde_json::Value>> {
        self.read_messages_impl()
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn close(&mut self) -> Result<()> {
        self.close_impl().await
    }
}

impl Drop for SubprocessTransport {
    fn drop(&mut self) {
        self.drop_impl();
    }
}
