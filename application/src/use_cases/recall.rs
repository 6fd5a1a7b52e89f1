//! Recall use case (read-only search over past executions).
//!
//! A separate read path over the same append-only log store the executor
//! writes to. Semantic search applies only when enabled and an embedding
//! provider is configured; everything else is keyword lookup. Results are
//! always scoped to the requesting layer.

use crate::ports::embedding::EmbeddingProvider;
use crate::ports::log_store::{ExecutionLogStore, LogStoreError, RecallFilter};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use vocab_domain::alias::entities::Layer;
use vocab_domain::execution::entities::ExecutionLog;

#[derive(Error, Debug)]
pub enum RecallError {
    #[error(transparent)]
    Store(#[from] LogStoreError),
}

/// Options for one recall call.
#[derive(Debug, Clone)]
pub struct RecallOptions {
    /// Only logs tagged with this entity (slugged automatically)
    pub entity: Option<String>,
    pub limit: usize,
    /// Prefer semantic ranking when an embedding provider is available
    pub use_semantic: bool,
}

impl Default for RecallOptions {
    fn default() -> Self {
        Self {
            entity: None,
            limit: 10,
            use_semantic: true,
        }
    }
}

/// Use case for searching past executions.
pub struct RecallUseCase<S: ExecutionLogStore> {
    store: Arc<S>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
}

impl<S: ExecutionLogStore> RecallUseCase<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            embedder: None,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Ranked (semantic) or newest-first (keyword) search for `query`
    /// within `layer`.
    pub async fn recall(
        &self,
        query: &str,
        layer: &Layer,
        options: RecallOptions,
    ) -> Result<Vec<ExecutionLog>, RecallError> {
        let filter = RecallFilter {
            entity: options.entity.as_deref().map(vocab_domain::slugify),
            limit: options.limit,
        };

        if options.use_semantic {
            if let Some(embedder) = &self.embedder {
                match embedder.embed(query).await {
                    Ok(embedding) => {
                        return Ok(self.store.search_semantic(&embedding, layer, &filter).await?);
                    }
                    Err(e) => {
                        // Degrade to keyword lookup for this call
                        warn!("recall embedding failed, falling back to keyword search: {e}");
                    }
                }
            }
        }

        Ok(self.store.search(query, layer, &filter).await?)
    }

    /// Convenience: keyword-only lookup of executions tagged with `entity`.
    pub async fn recall_by_entity(
        &self,
        entity: &str,
        layer: &Layer,
        limit: usize,
    ) -> Result<Vec<ExecutionLog>, RecallError> {
        self.recall(
            "",
            layer,
            RecallOptions {
                entity: Some(entity.to_string()),
                limit,
                use_semantic: false,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::embedding::EmbeddingError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use vocab_domain::execution::entities::NewExecutionLog;

    // ==================== Test Mocks ====================

    #[derive(Default)]
    struct SpyStore {
        keyword_calls: AtomicUsize,
        semantic_calls: AtomicUsize,
        last_filter: Mutex<Option<RecallFilter>>,
    }

    #[async_trait]
    impl ExecutionLogStore for SpyStore {
        async fn append(&self, _log: NewExecutionLog) -> Result<ExecutionLog, LogStoreError> {
            Err(LogStoreError::Append("read-only spy".into()))
        }

        async fn search(
            &self,
            _query: &str,
            _layer: &Layer,
            filter: &RecallFilter,
        ) -> Result<Vec<ExecutionLog>, LogStoreError> {
            self.keyword_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_filter.lock().unwrap() = Some(filter.clone());
            Ok(vec![])
        }

        async fn search_semantic(
            &self,
            _embedding: &[f32],
            _layer: &Layer,
            filter: &RecallFilter,
        ) -> Result<Vec<ExecutionLog>, LogStoreError> {
            self.semantic_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_filter.lock().unwrap() = Some(filter.clone());
            Ok(vec![])
        }
    }

    struct MockEmbedder {
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            if self.fail {
                Err(EmbeddingError::Failed("offline".into()))
            } else {
                Ok(vec![0.5, 0.5])
            }
        }
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_semantic_path_when_embedder_available() {
        let store = Arc::new(SpyStore::default());
        let uc = RecallUseCase::new(store.clone())
            .with_embedder(Arc::new(MockEmbedder { fail: false }));

        uc.recall("reminders for grace", &Layer::Public, RecallOptions::default())
            .await
            .unwrap();

        assert_eq!(store.semantic_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.keyword_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_keyword_when_no_embedder() {
        let store = Arc::new(SpyStore::default());
        let uc = RecallUseCase::new(store.clone());

        uc.recall("reminders", &Layer::Public, RecallOptions::default())
            .await
            .unwrap();

        assert_eq!(store.keyword_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.semantic_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_falls_back_to_keyword() {
        let store = Arc::new(SpyStore::default());
        let uc = RecallUseCase::new(store.clone())
            .with_embedder(Arc::new(MockEmbedder { fail: true }));

        uc.recall("reminders", &Layer::Public, RecallOptions::default())
            .await
            .unwrap();

        assert_eq!(store.keyword_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.semantic_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recall_by_entity_is_keyword_with_slug() {
        let store = Arc::new(SpyStore::default());
        let uc = RecallUseCase::new(store.clone())
            .with_embedder(Arc::new(MockEmbedder { fail: false }));

        uc.recall_by_entity("Grace Hopper", &Layer::Public, 5)
            .await
            .unwrap();

        // Entity recall never uses the semantic path
        assert_eq!(store.semantic_calls.load(Ordering::SeqCst), 0);
        let filter = store.last_filter.lock().unwrap().clone().unwrap();
        assert_eq!(filter.entity.as_deref(), Some("grace-hopper"));
        assert_eq!(filter.limit, 5);
    }
}
