//! Tool definitions and results for in-process servers

use anyhow::{Context, anyhow};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Arguments of a `tools/call`, keyed by parameter name
pub type ToolArguments = Map<String, Value>;

/// Handler invoked for a `tools/call`
pub type ToolHandler = Arc<
    dyn Fn(ToolArguments) -> Pin<Box<dyn Future<Output = anyhow::Result<ToolResult>> + Send>>
        + Send
        + Sync,
>;

/// One item of a tool result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Plain text
    Text {
        /// The text
        text: String,
    },
    /// Base64-encoded binary data
    Image {
        /// Base64 payload
        data: String,
        /// MIME type of the payload
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

/// Result of a tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    /// Content items, in order
    pub content: Vec<ToolContent>,
    /// Whether the tool reports failure to the model
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// A single text item
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// A text item flagged as an error
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// A single image item
    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Image {
                data: data.into(),
                mime_type: mime_type.into(),
            }],
            is_error: false,
        }
    }

    /// Concatenate the content of several results
    ///
    /// The combined result is an error if any part is.
    pub fn multi(parts: impl IntoIterator<Item = Self>) -> Self {
        parts.into_iter().fold(
            Self {
                content: Vec::new(),
                is_error: false,
            },
            |mut acc, part| {
                acc.content.extend(part.content);
                acc.is_error |= part.is_error;
                acc
            },
        )
    }
}

/// A tool exposed by an [`SdkMcpServer`](super::SdkMcpServer)
#[derive(Clone)]
pub struct SdkMcpTool {
    name: String,
    description: String,
    input_schema: Value,
    handler: ToolHandler,
}

impl SdkMcpTool {
    /// Create a tool from a JSON schema and an async handler
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ToolResult>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }

    /// Create a tool whose input schema is derived from `T`
    ///
    /// Arguments are still delivered as a map; use
    /// `serde_json::from_value(Value::Object(args))` to get a `T` back.
    pub fn with_schema<T, F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Self
    where
        T: JsonSchema,
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ToolResult>> + Send + 'static,
    {
        let schema = schemars::schema_for!(T).to_value();
        Self::new(name, description, schema, handler)
    }

    /// Tool name, unique within its server
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tool description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// JSON schema of the arguments
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Run the handler
    ///
    /// # Errors
    /// Returns whatever the handler returns
    pub async fn call(&self, args: ToolArguments) -> anyhow::Result<ToolResult> {
        (self.handler)(args).await
    }
}

impl fmt::Debug for SdkMcpTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkMcpTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish_non_exhaustive()
    }
}

/// Typed accessors for tool arguments
pub trait ArgumentsExt {
    /// Required string argument
    ///
    /// # Errors
    /// Fails if the key is missing or not a string
    fn require_str(&self, key: &str) -> anyhow::Result<&str>;

    /// Required numeric argument
    ///
    /// # Errors
    /// Fails if the key is missing or not a number
    fn require_f64(&self, key: &str) -> anyhow::Result<f64>;

    /// Required integer argument
    ///
    /// # Errors
    /// Fails if the key is missing or not an integer
    fn require_i64(&self, key: &str) -> anyhow::Result<i64>;

    /// Required boolean argument
    ///
    /// # Errors
    /// Fails if the key is missing or not a boolean
    fn require_bool(&self, key: &str) -> anyhow::Result<bool>;

    /// Optional string argument with a fallback
    fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str;

    /// Optional numeric argument with a fallback
    fn f64_or(&self, key: &str, default: f64) -> f64;
}

impl ArgumentsExt for ToolArguments {
    fn require_str(&self, key: &str) -> anyhow::Result<&str> {
        required(self, key)?
            .as_str()
            .ok_or_else(|| anyhow!("parameter {key} must be a string"))
    }

    fn require_f64(&self, key: &str) -> anyhow::Result<f64> {
        required(self, key)?
            .as_f64()
            .ok_or_else(|| anyhow!("parameter {key} must be a number"))
    }

    fn require_i64(&self, key: &str) -> anyhow::Result<i64> {
        let value = required(self, key)?;
        // Agents often send integral floats such as 3.0
        value
            .as_i64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && (I64_LOWER..I64_UPPER).contains(f))
                    .map(|f| f as i64)
            })
            .ok_or_else(|| anyhow!("parameter {key} must be an integer"))
    }

    fn require_bool(&self, key: &str) -> anyhow::Result<bool> {
        required(self, key)?
            .as_bool()
            .ok_or_else(|| anyhow!("parameter {key} must be a boolean"))
    }

    fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(Value::as_str).unwrap_or(default)
    }

    fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(Value::as_f64).unwrap_or(default)
    }
}

// -2^63 is exact; 2^63 is the first float past i64::MAX
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

fn required<'a>(args: &'a ToolArguments, key: &str) -> anyhow::Result<&'a Value> {
    args.get(key)
        .with_context(|| format!("missing required parameter: {key}"))
}
