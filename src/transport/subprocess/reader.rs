//! Stdout framing task

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;

use crate::error::{ClaudeError, Result};
use crate::transport::codec::JsonLineCodec;

use super::config::DEFAULT_READ_CAPACITY;
use super::transport::SubprocessTransport;

impl SubprocessTransport {
    /// Spawn the task framing stdout into JSON objects
    ///
    /// After stdout ends the task reaps the process; a non-zero exit is sent
    /// as a final `Process` error.
    pub(super) fn read_messages_impl(&mut self) -> mpsc::Receiver<Result<serde_json::Value>> {
        let (tx, rx) = mpsc::channel(DEFAULT_READ_CAPACITY);

        let Some(stdout) = self.stdout.take() else {
            let _ = tx.try_send(Err(ClaudeError::connection(
                "Not connected - stdout not available",
            )));
            return rx;
        };
        let process = self.process.clone();
        let codec = JsonLineCodec::new(self.max_buffer_size);

        let task = tokio::spawn(async move {
            let mut frames = FramedRead::new(stdout, codec);

            while let Some(frame) = frames.next().await {
                // Decoder errors are I/O failures; framing errors arrive as items
                let item = frame.unwrap_or_else(Err);
                if tx.send(item).await.is_err() {
                    return;
                }
            }

            let Some(mut child) = process.lock().await.take() else {
                return;
            };
            match child.wait().await {
                Ok(status) if status.success() => log::debug!("CLI exited cleanly"),
                Ok(status) => {
                    let code = status.code().unwrap_or(-1);
                    let _ = tx
                        .send(Err(ClaudeError::process(
                            "Command failed",
                            code,
                            Some("Check stderr output for details".to_string()),
                        )))
                        .await;
                }
                Err(e) => {
                    let _ = tx.send(Err(ClaudeError::Io(e))).await;
                }
            }
        });

        self.reader_task = Some(task);
        rx
    }
}
