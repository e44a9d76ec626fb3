//! Subprocess transport running the agent CLI
//!
//! Spawns the CLI with piped stdio, writes envelopes to stdin and frames
//! stdout with [`JsonLineCodec`](super::JsonLineCodec).

mod command;
mod config;
mod lifecycle;
mod reader;
mod transport;

pub use config::{ALLOWED_EXTRA_FLAGS, DANGEROUS_ENV_VARS, DEFAULT_READ_CAPACITY, PromptInput};
pub use transport::SubprocessTransport;
