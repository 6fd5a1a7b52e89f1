//! Tool invoker port
//!
//! Defines how the executor reaches the external capabilities an action
//! chain names. Concrete tools are caller-defined and opaque to the core.

use async_trait::async_trait;
use serde_json::{Map, Value};
use vocab_domain::execution::output::{ToolError, ToolOutput};

/// Port for tool invocation.
///
/// Implementations must return `Err` on failure; a failed invocation is
/// the one error kind that halts a running chain. Timeout and cancellation
/// are the tool contract's responsibility, not this layer's.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Invoke `tool` with fully interpolated params.
    async fn invoke(&self, tool: &str, params: &Map<String, Value>)
        -> Result<ToolOutput, ToolError>;
}
