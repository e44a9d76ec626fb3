//! Constants and prompt mode for the subprocess transport

/// Capacity of the channel between the stdout reader and the engine
pub const DEFAULT_READ_CAPACITY: usize = 64;

/// Environment variables never forwarded from `options.env`
///
/// These change how the child loads code.
pub const DANGEROUS_ENV_VARS: &[&str] = &[
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "DYLD_INSERT_LIBRARIES",
    "DYLD_LIBRARY_PATH",
    "PATH",
    "NODE_OPTIONS",
    "PYTHONPATH",
    "PERL5LIB",
    "RUBYLIB",
];

/// Flags accepted through `options.extra_args`
pub const ALLOWED_EXTRA_FLAGS: &[&str] = &[
    "timeout",
    "retries",
    "log-level",
    "cache-dir",
    "debug-to-stderr",
    "max-thinking-tokens",
];

/// How the prompt reaches the CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    /// One prompt on the command line; stdin is closed after spawn
    String(String),
    /// User messages are streamed over stdin
    Stream,
}

impl PromptInput {
    /// Whether stdin stays open for streamed messages
    #[must_use]
    pub const fn is_streaming(&self) -> bool {
        matches!(self, Self::Stream)
    }
}

impl From<String> for PromptInput {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for PromptInput {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}
