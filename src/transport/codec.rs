//! Line-accumulating JSON framer
//!
//! The agent writes one JSON object per line, but a line-oriented reader may
//! hand a single object over in several pieces. [`JsonLineCodec`] trims each
//! physical line, appends it to a buffer and tries to parse the buffer after
//! every line. A parse that succeeds yields the object and resets the buffer;
//! a parse that fails keeps accumulating.
//!
//! Framing failures are yielded as `Err` *items* rather than decoder errors,
//! so a `FramedRead` keeps going after an oversized or truncated object.

use serde_json::Value;
use tokio_util::bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::error::{ClaudeError, Result};
use crate::types::options::DEFAULT_MAX_BUFFER_SIZE;

/// Decoder turning newline-delimited text into JSON values
#[derive(Debug)]
pub struct JsonLineCodec {
    buffer: String,
    max_buffer_size: usize,
    discarding: bool,
}

impl JsonLineCodec {
    /// Create a codec that rejects objects larger than `max_buffer_size` bytes
    #[must_use]
    pub fn new(max_buffer_size: usize) -> Self {
        Self {
            buffer: String::new(),
            max_buffer_size,
            discarding: false,
        }
    }

    /// Maximum accumulated size in bytes
    #[must_use]
    pub const fn max_buffer_size(&self) -> usize {
        self.max_buffer_size
    }

    /// Bytes currently held for an incomplete object
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one physical line
    ///
    /// Returns `None` while the buffered object is incomplete.
    pub fn push_line(&mut self, line: &str) -> Option<Result<Value>> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        self.buffer.push_str(line);
        if self.buffer.len() > self.max_buffer_size {
            self.buffer.clear();
            return Some(Err(self.overflow()));
        }

        match serde_json::from_str::<Value>(&self.buffer) {
            Ok(value) => {
                self.buffer.clear();
                Some(Ok(value))
            }
            Err(_) => None,
        }
    }

    fn overflow(&self) -> ClaudeError {
        ClaudeError::json_decode(format!(
            "JSON message exceeded maximum buffer size of {} bytes",
            self.max_buffer_size
        ))
    }
}

impl Default for JsonLineCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BUFFER_SIZE)
    }
}

impl Decoder for JsonLineCodec {
    type Item = Result<Value>;
    type Error = ClaudeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            let Some(newline) = src.iter().position(|b| *b == b'\n') else {
                if self.discarding {
                    src.clear();
                } else if self.buffer.len() + src.len() > self.max_buffer_size {
                    // Line without a terminator already too big to ever fit
                    src.clear();
                    self.buffer.clear();
                    self.discarding = true;
                    return Ok(Some(Err(self.overflow())));
                }
                return Ok(None);
            };

            let line = src.split_to(newline + 1);
            if self.discarding {
                self.discarding = false;
                continue;
            }

            let text = String::from_utf8_lossy(&line[..newline]);
            if let Some(item) = self.push_line(&text) {
                return Ok(Some(item));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(item) = self.decode(src)? {
            return Ok(Some(item));
        }

        if !src.is_empty() {
            let rest = src.split_to(src.len());
            if self.discarding {
                self.discarding = false;
            } else if let Some(item) = self.push_line(&String::from_utf8_lossy(&rest)) {
                return Ok(Some(item));
            }
        }

        if self.buffer.is_empty() {
            Ok(None)
        } else {
            let len = self.buffer.len();
            self.buffer.clear();
            Ok(Some(Err(ClaudeError::json_decode(format!(
                "stream ended inside a JSON message ({len} bytes buffered)"
            )))))
        }
    }
}
