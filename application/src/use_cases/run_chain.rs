//! Run Chain use case (the action-chain executor).
//!
//! Runs a matched alias's actions strictly in declared order, one in flight
//! at a time. A false guard condition skips its action and the chain keeps
//! going; a failed tool invocation stops it (fail-fast). Each action's
//! declared output becomes visible to every later action's condition and
//! interpolation.
//!
//! The public contract never raises: every run yields an
//! [`ExecutionResult`] with the step trace, final outputs, summary, and the
//! audit record built by [`RecordExecutionUseCase`].

use crate::ports::log_store::ExecutionLogStore;
use crate::ports::tool_invoker::ToolInvoker;
use crate::use_cases::record_execution::{RecordExecutionInput, RecordExecutionUseCase};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use vocab_domain::alias::entities::{Alias, Layer};
use vocab_domain::condition::evaluate;
use vocab_domain::execution::entities::{ExecutionContext, ExecutionResult, ExecutionStep};
use vocab_domain::interpolate::interpolate_param;

/// One run's worth of input: the matched alias, the variables captured from
/// the request, and the caller's session.
#[derive(Debug, Clone)]
pub struct RunChainInput {
    pub alias: Alias,
    pub extracted_vars: HashMap<String, String>,
    pub input_request: String,
    /// Session variables; extracted vars shadow same-named entries
    pub session_vars: Map<String, Value>,
    pub layer: Layer,
    pub user_id: Option<String>,
}

impl RunChainInput {
    pub fn new(alias: Alias, input_request: impl Into<String>) -> Self {
        Self {
            alias,
            extracted_vars: HashMap::new(),
            input_request: input_request.into(),
            session_vars: Map::new(),
            layer: Layer::Public,
            user_id: None,
        }
    }

    pub fn with_extracted_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.extracted_vars = vars;
        self
    }

    pub fn with_session_var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.session_vars.insert(key.into(), value.into());
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Use case for executing one alias's action chain.
pub struct RunChainUseCase<T: ToolInvoker, S: ExecutionLogStore> {
    invoker: Arc<T>,
    recorder: Arc<RecordExecutionUseCase<S>>,
}

impl<T: ToolInvoker, S: ExecutionLogStore> RunChainUseCase<T, S> {
    pub fn new(invoker: Arc<T>, recorder: Arc<RecordExecutionUseCase<S>>) -> Self {
        Self { invoker, recorder }
    }

    /// Execute the chain. Never returns an error: tool failures are
    /// captured in the trace and `success` flag.
    pub async fn execute(&self, input: RunChainInput) -> ExecutionResult {
        let run_started = Instant::now();
        let mut ctx = ExecutionContext::new(input.layer.clone());
        ctx.user_id = input.user_id.clone();
        ctx.vars = input.session_vars.clone();
        for (key, value) in &input.extracted_vars {
            ctx.vars.insert(key.clone(), Value::String(value.clone()));
        }

        let mut steps: Vec<ExecutionStep> = Vec::new();
        let mut success = true;
        let mut error_message: Option<String> = None;

        for (index, action) in input.alias.actions.iter().enumerate() {
            let scope = ctx.scope();

            // Guard condition: false (or unparseable) skips, never halts
            if let Some(condition) = &action.condition {
                if !evaluate(condition, &scope) {
                    debug!(tool = %action.tool, condition = %condition, "action skipped");
                    steps.push(ExecutionStep::skipped(
                        index,
                        &action.tool,
                        format!("condition '{condition}' evaluated to false"),
                    ));
                    continue;
                }
            }

            let mut resolved = Map::new();
            for (key, value) in &action.params {
                resolved.insert(key.clone(), interpolate_param(value, &scope));
            }

            debug!(tool = %action.tool, step = index, "invoking tool");
            let step_started_at = Utc::now();
            let step_clock = Instant::now();
            let outcome = self.invoker.invoke(&action.tool, &resolved).await;
            let duration_ms = step_clock.elapsed().as_millis() as u64;

            match outcome {
                Ok(output) => {
                    if let Some(name) = &action.output {
                        ctx.outputs.insert(name.clone(), output.to_value());
                    }
                    steps.push(ExecutionStep::completed(
                        index,
                        &action.tool,
                        resolved,
                        step_started_at,
                        duration_ms,
                        output,
                    ));
                }
                Err(error) => {
                    warn!(tool = %action.tool, step = index, "tool invocation failed: {error}");
                    error_message = Some(format!("{} failed: {}", action.tool, error));
                    steps.push(ExecutionStep::failed(
                        index,
                        &action.tool,
                        resolved,
                        step_started_at,
                        duration_ms,
                        error,
                    ));
                    success = false;
                    // Fail-fast: remaining actions are not processed
                    break;
                }
            }
        }

        let duration_ms = run_started.elapsed().as_millis() as u64;

        // Entity extraction sees the extracted vars plus textual session vars
        let mut entity_vars = input.extracted_vars.clone();
        for (key, value) in &input.session_vars {
            if let Value::String(s) = value {
                entity_vars.entry(key.clone()).or_insert_with(|| s.clone());
            }
        }

        let (summary, log) = self
            .recorder
            .record(RecordExecutionInput {
                alias_id: input.alias.id,
                alias_pattern: input.alias.pattern.clone(),
                input_request: input.input_request.clone(),
                extracted_vars: input.extracted_vars.clone(),
                entity_vars,
                steps: steps.clone(),
                success,
                error_message: error_message.clone(),
                layer: input.layer.clone(),
                user_id: input.user_id.clone(),
                duration_ms,
            })
            .await;

        ExecutionResult {
            success,
            steps,
            outputs: ctx.outputs,
            summary,
            error_message,
            log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::log_store::{LogStoreError, RecallFilter};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use vocab_domain::alias::entities::AliasAction;
    use vocab_domain::execution::entities::{ExecutionLog, NewExecutionLog, StepOutcome};
    use vocab_domain::execution::output::{ToolError, ToolOutput};

    // ==================== Test Mocks ====================

    /// Records invocations and replies per-tool from a scripted table.
    #[derive(Default)]
    struct MockInvoker {
        responses: Mutex<HashMap<String, Result<ToolOutput, ToolError>>>,
        calls: Mutex<Vec<(String, Map<String, Value>)>>,
    }

    impl MockInvoker {
        fn respond(self, tool: &str, response: Result<ToolOutput, ToolError>) -> Self {
            self.responses.lock().unwrap().insert(tool.to_string(), response);
            self
        }

        fn calls(&self) -> Vec<(String, Map<String, Value>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToolInvoker for MockInvoker {
        async fn invoke(
            &self,
            tool: &str,
            params: &Map<String, Value>,
        ) -> Result<ToolOutput, ToolError> {
            self.calls
                .lock()
                .unwrap()
                .push((tool.to_string(), params.clone()));
            self.responses
                .lock()
                .unwrap()
                .get(tool)
                .cloned()
                .unwrap_or(Ok(ToolOutput::Empty))
        }
    }

    struct MemoryStore {
        logs: Mutex<Vec<ExecutionLog>>,
        fail: bool,
    }

    impl MemoryStore {
        fn new(fail: bool) -> Self {
            Self {
                logs: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl ExecutionLogStore for MemoryStore {
        async fn append(&self, log: NewExecutionLog) -> Result<ExecutionLog, LogStoreError> {
            if self.fail {
                return Err(LogStoreError::Append("store offline".into()));
            }
            let log = log.into_log(uuid::Uuid::new_v4().to_string(), Utc::now());
            self.logs.lock().unwrap().push(log.clone());
            Ok(log)
        }

        async fn search(
            &self,
            _query: &str,
            _layer: &Layer,
            _filter: &RecallFilter,
        ) -> Result<Vec<ExecutionLog>, LogStoreError> {
            Ok(self.logs.lock().unwrap().clone())
        }

        async fn search_semantic(
            &self,
            _embedding: &[f32],
            _layer: &Layer,
            _filter: &RecallFilter,
        ) -> Result<Vec<ExecutionLog>, LogStoreError> {
            Ok(vec![])
        }
    }

    fn use_case(
        invoker: MockInvoker,
        fail_store: bool,
    ) -> RunChainUseCase<MockInvoker, MemoryStore> {
        let recorder = Arc::new(RecordExecutionUseCase::new(Arc::new(MemoryStore::new(
            fail_store,
        ))));
        RunChainUseCase::new(Arc::new(invoker), recorder)
    }

    fn chain_alias(actions: Vec<AliasAction>) -> Alias {
        let mut alias = Alias::new("do {thing}", "test chain");
        alias.actions = actions;
        alias
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_scenario_b_cross_step_interpolation() {
        let invoker = MockInvoker::default()
            .respond(
                "lookupContact",
                Ok(ToolOutput::Structured(json!({"id": "c1"}))),
            )
            .respond("createReminder", Ok(ToolOutput::Text("done".into())));
        let alias = chain_alias(vec![
            AliasAction::new("lookupContact")
                .with_param("name", "{person}")
                .with_output("contact"),
            AliasAction::new("createReminder")
                .with_param("contactId", "{contact.id}")
                .with_param("note", "string tied after {event}"),
        ]);

        let uc = use_case(invoker, false);
        let invoker_ref = Arc::clone(&uc.invoker);
        let result = uc
            .execute(
                RunChainInput::new(alias, "tie a string to Grace after Q1").with_extracted_vars(
                    HashMap::from([
                        ("person".to_string(), "Grace".to_string()),
                        ("event".to_string(), "Q1".to_string()),
                    ]),
                ),
            )
            .await;

        assert!(result.success);
        assert_eq!(result.steps.len(), 2);

        let calls = invoker_ref.calls();
        assert_eq!(calls[0].0, "lookupContact");
        assert_eq!(calls[0].1["name"], json!("Grace"));
        assert_eq!(calls[1].0, "createReminder");
        assert_eq!(calls[1].1["contactId"], json!("c1"));
        assert_eq!(calls[1].1["note"], json!("string tied after Q1"));
    }

    #[tokio::test]
    async fn test_fail_fast_truncates_trace() {
        let invoker = MockInvoker::default()
            .respond("a", Ok(ToolOutput::Text("ok".into())))
            .respond("b", Err(ToolError::execution_failed("boom")))
            .respond("c", Ok(ToolOutput::Text("never".into())));
        let alias = chain_alias(vec![
            AliasAction::new("a"),
            AliasAction::new("b"),
            AliasAction::new("c"),
        ]);

        let uc = use_case(invoker, false);
        let invoker_ref = Arc::clone(&uc.invoker);
        let result = uc.execute(RunChainInput::new(alias, "run abc")).await;

        assert!(!result.success);
        // Failure at action 2 of 3: exactly 2 steps, none for action 3
        assert_eq!(result.steps.len(), 2);
        assert!(result.steps[1].outcome.is_failed());
        assert_eq!(invoker_ref.calls().len(), 2);
        assert!(result.error_message.as_deref().unwrap().contains("boom"));
        assert_eq!(result.log.success, false);
    }

    #[tokio::test]
    async fn test_skip_continue() {
        let invoker = MockInvoker::default()
            .respond("first", Ok(ToolOutput::Text("ran".into())))
            .respond("guarded", Ok(ToolOutput::Text("should not run".into())))
            .respond("last", Ok(ToolOutput::Text("also ran".into())));
        let alias = chain_alias(vec![
            AliasAction::new("first"),
            AliasAction::new("guarded").with_condition("count > 10"),
            AliasAction::new("last"),
        ]);

        let uc = use_case(invoker, false);
        let invoker_ref = Arc::clone(&uc.invoker);
        let result = uc
            .execute(RunChainInput::new(alias, "req").with_session_var("count", 3))
            .await;

        assert!(result.success);
        assert_eq!(result.steps.len(), 3);
        match &result.steps[1].outcome {
            StepOutcome::Skipped { reason } => assert!(!reason.is_empty()),
            other => panic!("expected skipped step, got {other:?}"),
        }
        // The skipped action was never invoked; the chain continued
        let tools: Vec<String> = invoker_ref.calls().into_iter().map(|c| c.0).collect();
        assert_eq!(tools, vec!["first", "last"]);
    }

    #[tokio::test]
    async fn test_condition_sees_prior_outputs() {
        let invoker = MockInvoker::default()
            .respond(
                "lookup",
                Ok(ToolOutput::Structured(json!({"found": false}))),
            )
            .respond("notify", Ok(ToolOutput::Text("sent".into())));
        let alias = chain_alias(vec![
            AliasAction::new("lookup").with_output("result"),
            AliasAction::new("notify").with_condition("result.found"),
        ]);

        let result = use_case(invoker, false)
            .execute(RunChainInput::new(alias, "req"))
            .await;

        assert!(result.success);
        assert!(result.steps[1].outcome.is_skipped());
    }

    #[tokio::test]
    async fn test_empty_chain_succeeds() {
        let result = use_case(MockInvoker::default(), false)
            .execute(RunChainInput::new(chain_alias(vec![]), "req"))
            .await;

        assert!(result.success);
        assert!(result.steps.is_empty());
        assert_eq!(result.summary, "No actions executed");
    }

    #[tokio::test]
    async fn test_malformed_condition_skips_not_aborts() {
        let invoker = MockInvoker::default()
            .respond("guarded", Ok(ToolOutput::Text("x".into())))
            .respond("after", Ok(ToolOutput::Text("y".into())));
        let alias = chain_alias(vec![
            AliasAction::new("guarded").with_condition("count >"),
            AliasAction::new("after"),
        ]);

        let result = use_case(invoker, false)
            .execute(RunChainInput::new(alias, "req"))
            .await;

        assert!(result.success);
        assert!(result.steps[0].outcome.is_skipped());
        assert!(result.steps[1].outcome.is_completed());
    }

    #[tokio::test]
    async fn test_logging_isolation() {
        let build = |fail_store: bool| {
            let invoker = MockInvoker::default()
                .respond("a", Ok(ToolOutput::Text("done".into())));
            let alias = chain_alias(vec![AliasAction::new("a")]);
            (use_case(invoker, fail_store), alias)
        };

        let (uc_ok, alias_ok) = build(false);
        let (uc_fail, alias_fail) = build(true);
        let ok = uc_ok.execute(RunChainInput::new(alias_ok, "req")).await;
        let degraded = uc_fail.execute(RunChainInput::new(alias_fail, "req")).await;

        // A failing log write changes nothing but the log's provenance
        assert_eq!(ok.success, degraded.success);
        assert_eq!(ok.summary, degraded.summary);
        assert_eq!(ok.steps.len(), degraded.steps.len());
        assert!(!ok.log.is_ephemeral());
        assert!(degraded.log.is_ephemeral());
    }

    #[tokio::test]
    async fn test_single_token_param_preserves_type() {
        let invoker = MockInvoker::default()
            .respond("emit", Ok(ToolOutput::Empty))
            .respond("consume", Ok(ToolOutput::Empty));
        let alias = chain_alias(vec![
            AliasAction::new("emit")
                .with_param("count", "{count}")
                .with_param("payload", "{settings}"),
        ]);

        let uc = use_case(invoker, false);
        let invoker_ref = Arc::clone(&uc.invoker);
        uc.execute(
            RunChainInput::new(alias, "req")
                .with_session_var("count", 7)
                .with_session_var("settings", json!({"tz": "UTC"})),
        )
        .await;

        let calls = invoker_ref.calls();
        assert_eq!(calls[0].1["count"], json!(7));
        assert_eq!(calls[0].1["payload"], json!({"tz": "UTC"}));
    }
}
