//! Tool invocation results and errors.
//!
//! Tool return values are opaque to the core, but where the original system
//! shape-probed duck-typed results at runtime, this model tags them
//! explicitly so summarization logic is exhaustive.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error raised by a tool invocation. This is the only error kind that is
/// fatal to a running chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolError {
    /// Error code (e.g., "NOT_FOUND", "INVALID_ARGUMENT")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Common error constructors
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", format!("Resource not found: {}", resource.into()))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("INVALID_ARGUMENT", message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new("EXECUTION_FAILED", message)
    }

    pub fn unknown_tool(tool: impl Into<String>) -> Self {
        Self::new("UNKNOWN_TOOL", format!("No such tool: {}", tool.into()))
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {}

/// The result a tool hands back on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ToolOutput {
    /// Plain text
    Text(String),
    /// Arbitrary structured data
    Structured(Value),
    /// The tool produced nothing
    Empty,
}

impl ToolOutput {
    /// Build from an arbitrary JSON value, collapsing strings and null into
    /// their dedicated variants.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => ToolOutput::Empty,
            Value::String(s) => ToolOutput::Text(s),
            other => ToolOutput::Structured(other),
        }
    }

    /// The textual form used by the default summarizer: the text itself, or
    /// a structured result's top-level `message` field.
    pub fn message(&self) -> Option<&str> {
        match self {
            ToolOutput::Text(s) => Some(s.as_str()),
            ToolOutput::Structured(value) => value.get("message").and_then(Value::as_str),
            ToolOutput::Empty => None,
        }
    }

    /// The JSON projection stored in the outputs map for later steps'
    /// interpolation and conditions.
    pub fn to_value(&self) -> Value {
        match self {
            ToolOutput::Text(s) => Value::String(s.clone()),
            ToolOutput::Structured(value) => value.clone(),
            ToolOutput::Empty => Value::Null,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ToolOutput::Empty)
    }
}
