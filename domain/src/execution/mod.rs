//! Execution model: step traces, audit logs, and result summarization

pub mod entities;
pub mod output;
pub mod summary;

pub use entities::{
    ExecutionContext, ExecutionLog, ExecutionResult, ExecutionStep, NewExecutionLog, StepOutcome,
};
pub use output::{ToolError, ToolOutput};
pub use summary::{default_summary, extract_entities};
