//! Record Execution use case (the execution logger).
//!
//! Builds the result summary and recall entities for a finished run and
//! appends the audit record. Persistence is best-effort: a failing log
//! write is reported to the operator channel and the caller receives a
//! synthesized in-memory record instead, so the run's result is never
//! affected by storage trouble.

use crate::ports::embedding::EmbeddingProvider;
use crate::ports::log_store::ExecutionLogStore;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;
use vocab_domain::alias::entities::Layer;
use vocab_domain::execution::entities::{ExecutionLog, ExecutionStep, NewExecutionLog};
use vocab_domain::execution::summary::{default_summary, extract_entities};

/// Caller-supplied summary hook; receives the step trace, the overall
/// success flag, and the failure message if any.
pub type Summarizer = Arc<dyn Fn(&[ExecutionStep], bool, Option<&str>) -> String + Send + Sync>;

/// Caller-supplied entity extraction hook; receives the run's variables.
pub type EntityExtractor = Arc<dyn Fn(&HashMap<String, String>) -> Vec<String> + Send + Sync>;

/// Everything the logger needs to know about a finished run.
#[derive(Debug, Clone)]
pub struct RecordExecutionInput {
    pub alias_id: Uuid,
    pub alias_pattern: String,
    pub input_request: String,
    pub extracted_vars: HashMap<String, String>,
    /// String-valued run variables considered for entity extraction
    /// (extracted vars plus textual session vars)
    pub entity_vars: HashMap<String, String>,
    pub steps: Vec<ExecutionStep>,
    pub success: bool,
    pub error_message: Option<String>,
    pub layer: Layer,
    pub user_id: Option<String>,
    pub duration_ms: u64,
}

/// Use case for building and persisting one audit record.
pub struct RecordExecutionUseCase<S: ExecutionLogStore> {
    store: Arc<S>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    summarizer: Option<Summarizer>,
    entity_extractor: Option<EntityExtractor>,
}

impl<S: ExecutionLogStore> RecordExecutionUseCase<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            embedder: None,
            summarizer: None,
            entity_extractor: None,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Summarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_entity_extractor(mut self, extractor: EntityExtractor) -> Self {
        self.entity_extractor = Some(extractor);
        self
    }

    /// Summarize, extract entities, and persist. Returns the summary and
    /// the audit record (persisted, or synthesized when the store failed).
    pub async fn record(&self, input: RecordExecutionInput) -> (String, ExecutionLog) {
        let summary = match &self.summarizer {
            Some(hook) => hook(&input.steps, input.success, input.error_message.as_deref()),
            None => default_summary(&input.steps, input.success, input.error_message.as_deref()),
        };

        let entities = match &self.entity_extractor {
            Some(hook) => hook(&input.entity_vars),
            None => extract_entities(&input.entity_vars),
        };

        let request_embedding = match &self.embedder {
            Some(embedder) => match embedder.embed(&input.input_request).await {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("request embedding failed, log will not be semantically searchable: {e}");
                    None
                }
            },
            None => None,
        };

        let new_log = NewExecutionLog {
            alias_id: input.alias_id,
            alias_pattern: input.alias_pattern,
            input_request: input.input_request,
            extracted_vars: input.extracted_vars,
            steps: input.steps,
            result_summary: summary.clone(),
            success: input.success,
            error_message: input.error_message,
            entities,
            layer: input.layer,
            user_id: input.user_id,
            duration_ms: input.duration_ms,
            request_embedding,
        };

        let log = match self.store.append(new_log.clone()).await {
            Ok(log) => log,
            Err(e) => {
                // Operator channel only; the caller's result is unaffected
                warn!("failed to persist execution log: {e}");
                new_log.into_log(format!("mem-{}", Uuid::new_v4()), Utc::now())
            }
        };

        (summary, log)
    }
}
