//! Hook registration and callback-id resolution
//!
//! Callbacks cannot cross the process boundary, so the agent only ever sees
//! opaque ids. [`HookRegistry`] hands out one `hook_{n}` id per callback when a
//! connection starts, sends the agent the `{event: [{matcher, hookCallbackIds,
//! timeout}]}` table during `initialize`, and maps ids back to callbacks when
//! `hook_callback` requests arrive. Matcher patterns are forwarded verbatim;
//! matching happens on the agent side.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value, json};

use crate::error::{ClaudeError, Result};
use crate::types::hooks::{HookCallback, HookContext, HookEvent, HookInput, HookMatcher, HookOutput};
use crate::types::identifiers::CallbackId;

const CALLBACK_ID_PREFIX: &str = "hook_";

/// Slot table of hook callbacks for one connection
///
/// Ids are dense slot indexes, unique for the connection and stable until
/// [`clear`](Self::clear) invalidates all of them.
pub struct HookRegistry {
    slots: Mutex<Vec<Option<HookCallback>>>,
    wire_config: Option<Value>,
}

impl HookRegistry {
    /// Assign ids to every configured callback
    ///
    /// Events are visited in a fixed order so ids are reproducible for the
    /// same configuration.
    #[must_use]
    pub fn new(hooks: Option<&HashMap<HookEvent, Vec<HookMatcher>>>) -> Self {
        let mut slots = Vec::new();
        let mut config = Map::new();

        if let Some(hooks) = hooks {
            let mut events: Vec<_> = hooks.iter().filter(|(_, m)| !m.is_empty()).collect();
            events.sort_by_key(|(event, _)| **event);

            for (event, matchers) in events {
                let entries: Vec<Value> = matchers
                    .iter()
                    .map(|matcher| {
                        let ids: Vec<String> = matcher
                            .hooks
                            .iter()
                            .map(|callback| {
                                slots.push(Some(Arc::clone(callback)));
                                format!("{CALLBACK_ID_PREFIX}{}", slots.len() - 1)
                            })
                            .collect();
                        let mut entry = json!({
                            "matcher": matcher.matcher,
                            "hookCallbackIds": ids,
                        });
                        if let Some(timeout) = matcher.timeout {
                            entry["timeout"] = json!(timeout);
                        }
                        entry
                    })
                    .collect();
                config.insert(event.as_str().to_string(), Value::Array(entries));
            }
        }

        Self {
            slots: Mutex::new(slots),
            wire_config: (!config.is_empty()).then_some(Value::Object(config)),
        }
    }

    /// The `hooks` field of the `initialize` request, if any hooks exist
    #[must_use]
    pub fn wire_config(&self) -> Option<Value> {
        self.wire_config.clone()
    }

    /// Look up the callback behind an id
    ///
    /// # Errors
    /// Returns `ClaudeError::Hook` for ids this registry never issued or has
    /// invalidated
    pub fn resolve(&self, id: &CallbackId) -> Result<HookCallback> {
        let not_found = || ClaudeError::hook(format!("no hook callback found for ID: {id}"));

        let index: usize = id
            .as_str()
            .strip_prefix(CALLBACK_ID_PREFIX)
            .and_then(|n| n.parse().ok())
            .ok_or_else(not_found)?;

        self.slots
            .lock()
            .get(index)
            .and_then(Option::clone)
            .ok_or_else(not_found)
    }

    /// Invalidate every id
    pub fn clear(&self) {
        for slot in self.slots.lock().iter_mut() {
            *slot = None;
        }
    }

    /// Number of live callbacks
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().iter().filter(|s| s.is_some()).count()
    }

    /// Whether no callback is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Collects hook matchers per event
#[derive(Default)]
pub struct HookManager {
    matchers: HashMap<HookEvent, Vec<HookMatcher>>,
}

impl HookManager {
    /// Create an empty manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a matcher for an event
    #[must_use]
    pub fn register(mut self, event: HookEvent, matcher: HookMatcher) -> Self {
        self.matchers.entry(event).or_default().push(matcher);
        self
    }

    /// The configuration to put in `ClaudeAgentOptions::hooks`
    #[must_use]
    pub fn into_config(self) -> HashMap<HookEvent, Vec<HookMatcher>> {
        self.matchers
    }

    /// Create a hook callback from an async closure
    ///
    /// # Example
    ///
    /// ```rust
    /// use claude_agent_protocol::hooks::HookManager;
    /// use claude_agent_protocol::types::hooks::{HookInput, HookOutput};
    ///
    /// let hook = HookManager::callback(|input, _tool_use_id, _ctx| async move {
    ///     if input.tool_name() == Some("Bash") {
    ///         return Ok(HookOutput::deny_tool("no shell access"));
    ///     }
    ///     Ok(HookOutput::default())
    /// });
    /// ```
    pub fn callback<F, Fut>(f: F) -> HookCallback
    where
        F: Fn(HookInput, Option<String>, HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HookOutput>> + Send + 'static,
    {
        Arc::new(move |input, tool_use_id, context| Box::pin(f(input, tool_use_id, context)))
    }
}

/// Builder for creating hook matchers
pub struct HookMatcherBuilder {
    matcher: Option<String>,
    hooks: Vec<HookCallback>,
    timeout: Option<f64>,
}

impl HookMatcherBuilder {
    /// Create a builder
    ///
    /// `pattern` is `None` for every tool, or a tool name or pattern such as
    /// `"Write|Edit"` that the agent interprets.
    pub fn new(pattern: Option<impl Into<String>>) -> Self {
        Self {
            matcher: pattern.map(Into::into),
            hooks: Vec::new(),
            timeout: None,
        }
    }

    /// Add a hook callback
    #[must_use]
    pub fn add_hook(mut self, hook: HookCallback) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Timeout in seconds the agent applies to these hooks
    #[must_use]
    pub const fn timeout(mut self, seconds: f64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Build the hook matcher
    #[must_use]
    pub fn build(self) -> HookMatcher {
        HookMatcher {
            matcher: self.matcher,
            hooks: self.hooks,
            timeout: self.timeout,
        }
    }
}
