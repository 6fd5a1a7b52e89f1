//! Alias catalog port
//!
//! The catalog owns alias storage, the exact/fuzzy textual lookup, and the
//! vector search over pattern embeddings. Its admin surface (create, update,
//! enable/disable) is external; this core only reads and increments usage.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;
use vocab_domain::alias::entities::{Alias, Layer};

/// Errors surfaced by catalog adapters.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog lookup failed: {0}")]
    Lookup(String),

    #[error("Alias not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid alias pattern: {0}")]
    InvalidPattern(String),
}

/// Which of the catalog's two textual strategies matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogMatchKind {
    /// The request fits the alias pattern textually
    Exact,
    /// Similarity match, internal to the catalog (edit distance / trigram)
    Fuzzy,
}

/// A textual catalog match.
#[derive(Debug, Clone)]
pub struct CatalogMatch {
    pub alias: Alias,
    pub kind: CatalogMatchKind,
}

/// A vector-search catalog match.
#[derive(Debug, Clone)]
pub struct SemanticCatalogMatch {
    pub alias: Alias,
    /// Cosine similarity in [0, 1]
    pub similarity: f64,
}

/// Port for alias catalog lookups.
///
/// All lookups are restricted to aliases visible in `layer` (public or
/// same-scope) that are enabled and applicable to the request's context
/// tags.
#[async_trait]
pub trait AliasCatalog: Send + Sync {
    /// Exact-or-fuzzy textual lookup. The catalog tries exact first and
    /// reports which strategy matched.
    async fn find_alias(
        &self,
        request: &str,
        layer: &Layer,
        context_tags: &[String],
    ) -> Result<Option<CatalogMatch>, CatalogError>;

    /// Nearest alias by cosine similarity over pattern embeddings,
    /// considering at most `limit` candidates and discarding anything below
    /// `threshold`.
    async fn find_alias_semantic(
        &self,
        embedding: &[f32],
        layer: &Layer,
        threshold: f64,
        limit: usize,
    ) -> Result<Option<SemanticCatalogMatch>, CatalogError>;

    /// Best-effort usage accounting after a successful match. Counters need
    /// not be linearizable across concurrent runs.
    async fn increment_usage(&self, alias_id: Uuid) -> Result<(), CatalogError>;
}
