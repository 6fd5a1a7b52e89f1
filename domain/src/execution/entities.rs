//! Execution entities: step traces, contexts, and audit records

use crate::alias::entities::Layer;
use crate::execution::output::{ToolError, ToolOutput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Terminal state of one executed (or skipped) action. Exactly one variant
/// applies per step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StepOutcome {
    /// The tool was invoked and returned a result
    Completed { result: ToolOutput },
    /// The tool was invoked and failed; this halts the chain
    Failed { error: ToolError },
    /// The guard condition evaluated false; the chain continues
    Skipped { reason: String },
}

impl StepOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StepOutcome::Completed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped { .. })
    }
}

/// One entry of a run's step trace. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// Zero-based position in the action chain
    pub index: usize,
    pub tool: String,
    /// Params after interpolation, as passed to the tool
    pub params: Map<String, Value>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

impl ExecutionStep {
    pub fn completed(
        index: usize,
        tool: impl Into<String>,
        params: Map<String, Value>,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        result: ToolOutput,
    ) -> Self {
        Self {
            index,
            tool: tool.into(),
            params,
            started_at,
            completed_at: started_at + chrono::Duration::milliseconds(duration_ms as i64),
            duration_ms,
            outcome: StepOutcome::Completed { result },
        }
    }

    pub fn failed(
        index: usize,
        tool: impl Into<String>,
        params: Map<String, Value>,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        error: ToolError,
    ) -> Self {
        Self {
            index,
            tool: tool.into(),
            params,
            started_at,
            completed_at: started_at + chrono::Duration::milliseconds(duration_ms as i64),
            duration_ms,
            outcome: StepOutcome::Failed { error },
        }
    }

    pub fn skipped(index: usize, tool: impl Into<String>, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            index,
            tool: tool.into(),
            params: Map::new(),
            started_at: now,
            completed_at: now,
            duration_ms: 0,
            outcome: StepOutcome::Skipped {
                reason: reason.into(),
            },
        }
    }
}

/// Mutable state owned by one run: session variables, outputs accumulated
/// as actions complete, and the requester's scope. Not shared across runs.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Session variables merged with extracted pattern variables
    pub vars: Map<String, Value>,
    /// Outputs keyed by each action's declared `output` name
    pub outputs: Map<String, Value>,
    pub layer: Layer,
    pub user_id: Option<String>,
}

impl ExecutionContext {
    pub fn new(layer: Layer) -> Self {
        Self {
            layer,
            ..Default::default()
        }
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// The merged scope that conditions and interpolation resolve against:
    /// session vars overlaid by outputs, so outputs shadow same-named vars.
    pub fn scope(&self) -> Value {
        let mut merged = self.vars.clone();
        for (key, value) in &self.outputs {
            merged.insert(key.clone(), value.clone());
        }
        Value::Object(merged)
    }
}

/// Append-only audit record of one run. Never updated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    /// Persisted id, or a `mem-` prefixed id when persistence failed and
    /// the record exists only in memory
    pub id: String,
    pub alias_id: Uuid,
    pub alias_pattern: String,
    pub input_request: String,
    pub extracted_vars: HashMap<String, String>,
    pub steps: Vec<ExecutionStep>,
    pub result_summary: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Slugged identifiers extracted for later recall
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub layer: Layer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl ExecutionLog {
    /// Whether this record was synthesized in memory after a persistence
    /// failure.
    pub fn is_ephemeral(&self) -> bool {
        self.id.starts_with("mem-")
    }
}

/// The fields of a log record before the store assigns identity, plus the
/// optional request embedding for semantic recall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExecutionLog {
    pub alias_id: Uuid,
    pub alias_pattern: String,
    pub input_request: String,
    pub extracted_vars: HashMap<String, String>,
    pub steps: Vec<ExecutionStep>,
    pub result_summary: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub layer: Layer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_embedding: Option<Vec<f32>>,
}

impl NewExecutionLog {
    /// Promote to a full record with the identity the store assigned.
    pub fn into_log(self, id: String, created_at: DateTime<Utc>) -> ExecutionLog {
        ExecutionLog {
            id,
            alias_id: self.alias_id,
            alias_pattern: self.alias_pattern,
            input_request: self.input_request,
            extracted_vars: self.extracted_vars,
            steps: self.steps,
            result_summary: self.result_summary,
            success: self.success,
            error_message: self.error_message,
            entities: self.entities,
            layer: self.layer,
            user_id: self.user_id,
            duration_ms: self.duration_ms,
            created_at,
        }
    }
}

/// What the executor hands back for every run; the public execution
/// contract never raises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub steps: Vec<ExecutionStep>,
    /// Final outputs map (action `output` name → value)
    pub outputs: Map<String, Value>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// The audit record, persisted or synthesized
    pub log: ExecutionLog,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scope_outputs_shadow_vars() {
        let mut ctx = ExecutionContext::new(Layer::Public)
            .with_var("contact", "from-session")
            .with_var("person", "Grace");
        ctx.outputs
            .insert("contact".to_string(), json!({"id": "c1"}));

        let scope = ctx.scope();
        assert_eq!(scope["contact"]["id"], "c1");
        assert_eq!(scope["person"], "Grace");
    }

    #[test]
    fn test_step_outcome_serde_shape() {
        let step = ExecutionStep::skipped(2, "createReminder", "condition false");
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "condition false");
        assert_eq!(json["duration_ms"], 0);

        let back: ExecutionStep = serde_json::from_value(json).unwrap();
        assert!(back.outcome.is_skipped());
    }

    #[test]
    fn test_ephemeral_log_detection() {
        let new_log = NewExecutionLog {
            alias_id: Uuid::new_v4(),
            alias_pattern: "p".into(),
            input_request: "r".into(),
            extracted_vars: HashMap::new(),
            steps: vec![],
            result_summary: "s".into(),
            success: true,
            error_message: None,
            entities: vec![],
            layer: Layer::Public,
            user_id: None,
            duration_ms: 1,
            request_embedding: None,
        };
        let log = new_log.into_log(format!("mem-{}", Uuid::new_v4()), Utc::now());
        assert!(log.is_ephemeral());
    }
}
