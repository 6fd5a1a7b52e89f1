use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;
use vocab_application::ToolInvoker;
use vocab_domain::execution::output::{ToolError, ToolOutput};

/// Tool invoker that echoes every call back as a structured result.
///
/// Used by the CLI when no real tool backend is wired up, and handy for
/// dry-running an alias chain: each step's output shows the tool name and
/// the params it would have received after interpolation.
pub struct EchoToolInvoker;

#[async_trait]
impl ToolInvoker for EchoToolInvoker {
    async fn invoke(
        &self,
        tool: &str,
        params: &Map<String, Value>,
    ) -> Result<ToolOutput, ToolError> {
        debug!(tool, "Echoing tool invocation");
        Ok(ToolOutput::Structured(json!({
            "message": format!("echo: {}", tool),
            "tool": tool,
            "params": Value::Object(params.clone()),
        })))
    }
}
