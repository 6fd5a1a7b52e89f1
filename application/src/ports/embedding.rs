//! Embedding provider port
//!
//! Optional: when no provider is configured the semantic match tier and
//! semantic recall are disabled and keyword behavior applies everywhere.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding failed: {0}")]
    Failed(String),
}

/// Port for turning text into a vector. Vectors are expected to be unit
/// length so cosine similarity reduces to a dot product.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
