//! Spawning and tearing down the CLI process

use std::collections::HashMap;
use std::env;
use std::process::Stdio;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::ChildStderr;

use crate::VERSION;
use crate::error::{ClaudeError, Result};
use crate::types::options::StderrCallback;

use super::command::CommandBuilder;
use super::config::{DANGEROUS_ENV_VARS, PromptInput};
use super::transport::SubprocessTransport;

/// How long `close` waits for the CLI to exit before killing it
const EXIT_GRACE_PERIOD: Duration = Duration::from_secs(5);

impl SubprocessTransport {
    pub(super) async fn connect_impl(&mut self) -> Result<()> {
        if self.process.lock().await.is_some() {
            return Ok(());
        }

        let mut cmd = CommandBuilder::new(&self.cli_path, &self.prompt, &self.options).build();

        let mut process_env = env::vars().collect::<HashMap<_, _>>();
        for (key, value) in &self.options.env {
            if DANGEROUS_ENV_VARS.contains(&key.as_str()) {
                log::warn!("Not forwarding environment variable {key} to the CLI");
            } else {
                process_env.insert(key.clone(), value.clone());
            }
        }
        process_env.insert("CLAUDE_CODE_ENTRYPOINT".to_string(), "sdk-rust".to_string());
        process_env.insert("CLAUDE_AGENT_SDK_VERSION".to_string(), VERSION.to_string());

        if let Some(cwd) = &self.options.cwd {
            process_env.insert("PWD".to_string(), cwd.to_string_lossy().to_string());
            cmd.current_dir(cwd);
        }
        cmd.envs(process_env);

        // Piped rather than inherited so the child cannot touch the terminal
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            if let Some(cwd) = &self.options.cwd
                && !cwd.exists()
            {
                return ClaudeError::connection(format!(
                    "Working directory does not exist: {}",
                    cwd.display()
                ));
            }
            ClaudeError::connection(format!("Failed to start Claude Code: {e}"))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClaudeError::connection("Failed to get stdin handle"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClaudeError::connection("Failed to get stdout handle"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ClaudeError::connection("Failed to get stderr handle"))?;

        log::debug!(
            "Started {} (pid {:?})",
            self.cli_path.display(),
            child.id()
        );

        self.stderr_task = Some(tokio::spawn(forward_stderr(
            stderr,
            self.options.stderr.clone(),
        )));
        self.stdin = Some(stdin);
        self.stdout = Some(stdout);
        *self.process.lock().await = Some(child);
        self.ready.store(true, Ordering::SeqCst);

        if matches!(self.prompt, PromptInput::String(_))
            && let Some(mut stdin) = self.stdin.take()
        {
            let _ = stdin.shutdown().await;
        }

        Ok(())
    }

    pub(super) async fn close_impl(&mut self) -> Result<()> {
        self.ready.store(false, Ordering::SeqCst);

        if let Some(mut stdin) = self.stdin.take() {
            let _ = stdin.shutdown().await;
        }

        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        self.stdout = None;

        if let Some(mut child) = self.process.lock().await.take() {
            match tokio::time::timeout(EXIT_GRACE_PERIOD, child.wait()).await {
                Ok(Ok(status)) => log::debug!("CLI exited with {status}"),
                Ok(Err(e)) => return Err(ClaudeError::Io(e)),
                Err(_) => {
                    log::warn!("CLI did not exit within {EXIT_GRACE_PERIOD:?}; killing it");
                    let _ = child.kill().await;
                    let _ = child.wait().await;
                }
            }
        }

        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }

        Ok(())
    }

    pub(super) fn drop_impl(&mut self) {
        drop(self.stdin.take());

        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }

        if let Ok(mut guard) = self.process.try_lock()
            && let Some(mut child) = guard.take()
        {
            let _ = child.start_kill();
        }
    }
}

async fn forward_stderr(stderr: ChildStderr, callback: Option<StderrCallback>) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match &callback {
                Some(callback) => callback(&line),
                None => log::debug!("cli stderr: {line}"),
            },
            Ok(None) => break,
            Err(e) => {
                log::debug!("Stopped reading CLI stderr: {e}");
                break;
            }
        }
    }
}
