//! Execution log store port
//!
//! An append-only audit sink plus the read path the recaller consumes.
//! Records are never updated after creation.

use async_trait::async_trait;
use thiserror::Error;
use vocab_domain::alias::entities::Layer;
use vocab_domain::execution::entities::{ExecutionLog, NewExecutionLog};

#[derive(Error, Debug)]
pub enum LogStoreError {
    #[error("Failed to append execution log: {0}")]
    Append(String),

    #[error("Log search failed: {0}")]
    Search(String),
}

/// Narrowing options for recall searches.
#[derive(Debug, Clone)]
pub struct RecallFilter {
    /// Only logs tagged with this (slugged) entity
    pub entity: Option<String>,
    /// Maximum records returned, newest or best-ranked first
    pub limit: usize,
}

impl Default for RecallFilter {
    fn default() -> Self {
        Self {
            entity: None,
            limit: 10,
        }
    }
}

/// Port for the append-only execution log store.
#[async_trait]
pub trait ExecutionLogStore: Send + Sync {
    /// Persist one record, assigning its identity and creation time.
    async fn append(&self, log: NewExecutionLog) -> Result<ExecutionLog, LogStoreError>;

    /// Keyword search over past executions, scoped to `layer`, newest
    /// first.
    async fn search(
        &self,
        query: &str,
        layer: &Layer,
        filter: &RecallFilter,
    ) -> Result<Vec<ExecutionLog>, LogStoreError>;

    /// Ranked search by cosine similarity between `embedding` and each
    /// record's stored request embedding, scoped to `layer`.
    async fn search_semantic(
        &self,
        embedding: &[f32],
        layer: &Layer,
        filter: &RecallFilter,
    ) -> Result<Vec<ExecutionLog>, LogStoreError>;
}
