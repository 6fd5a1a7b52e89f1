//! Resolve Request use case (the match engine).
//!
//! Routes a free-text request to at most one alias through three strictly
//! ordered tiers: exact → fuzzy → semantic. The first tier that produces a
//! candidate wins; no cross-tier ranking occurs, so a fuzzy match always
//! beats a semantic candidate regardless of similarity scores.

use crate::config::MatchConfig;
use crate::ports::alias_catalog::{AliasCatalog, CatalogError, CatalogMatchKind};
use crate::ports::embedding::EmbeddingProvider;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use vocab_domain::alias::entities::{Alias, Layer};
use vocab_domain::alias::value_objects::{AliasMatchResult, MatchType};
use vocab_domain::pattern::{CompiledPattern, PatternError};

/// Confidence reported for fuzzy matches, fixed regardless of the catalog's
/// internal similarity score.
const FUZZY_CONFIDENCE: f64 = 0.8;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Alias '{pattern}' has an invalid pattern: {source}")]
    InvalidPattern {
        pattern: String,
        source: PatternError,
    },
}

/// Use case for resolving a request against the alias catalog.
///
/// `Ok(None)` means no tier produced a candidate; the caller decides the
/// fallback (e.g. prompting for clarification).
pub struct ResolveRequestUseCase<C: AliasCatalog> {
    catalog: Arc<C>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    config: MatchConfig,
}

impl<C: AliasCatalog> ResolveRequestUseCase<C> {
    pub fn new(catalog: Arc<C>) -> Self {
        Self {
            catalog,
            embedder: None,
            config: MatchConfig::default(),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve `request` within `layer`, narrowed by `context_tags`.
    pub async fn resolve(
        &self,
        request: &str,
        layer: &Layer,
        context_tags: &[String],
    ) -> Result<Option<AliasMatchResult>, ResolveError> {
        // Tiers 1-2: the catalog's textual lookup (exact preferred)
        if let Some(found) = self.catalog.find_alias(request, layer, context_tags).await? {
            let (match_type, confidence) = match found.kind {
                CatalogMatchKind::Exact => (MatchType::Exact, 1.0),
                CatalogMatchKind::Fuzzy => (MatchType::Fuzzy, FUZZY_CONFIDENCE),
            };
            debug!(
                pattern = %found.alias.pattern,
                tier = %match_type,
                "alias matched"
            );
            return Ok(Some(self.finish(found.alias, match_type, confidence, request).await?));
        }

        // Tier 3: semantic, only with a configured provider
        let Some(embedder) = self.embedder.as_ref().filter(|_| self.config.semantic_enabled)
        else {
            return Ok(None);
        };

        let embedding = match embedder.embed(request).await {
            Ok(v) => v,
            Err(e) => {
                // Non-fatal: disables the semantic tier for this call only
                warn!("embedding failed, skipping semantic tier: {e}");
                return Ok(None);
            }
        };

        let Some(found) = self
            .catalog
            .find_alias_semantic(
                &embedding,
                layer,
                self.config.semantic_threshold,
                self.config.semantic_limit,
            )
            .await?
        else {
            return Ok(None);
        };

        debug!(
            pattern = %found.alias.pattern,
            similarity = found.similarity,
            "semantic alias match"
        );
        let similarity = found.similarity;
        Ok(Some(
            self.finish(found.alias, MatchType::Semantic, similarity, request)
                .await?,
        ))
    }

    /// Extract variables from the request using the chosen alias's pattern
    /// and account for the usage, then assemble the match result.
    async fn finish(
        &self,
        alias: Alias,
        match_type: MatchType,
        confidence: f64,
        request: &str,
    ) -> Result<AliasMatchResult, ResolveError> {
        let compiled =
            CompiledPattern::compile(&alias.pattern).map_err(|source| ResolveError::InvalidPattern {
                pattern: alias.pattern.clone(),
                source,
            })?;

        // Fuzzy/semantic winners may not match the request textually; an
        // empty variable map is the defined outcome then.
        let extracted: HashMap<String, String> =
            compiled.match_request(request).unwrap_or_default();

        if let Err(e) = self.catalog.increment_usage(alias.id).await {
            warn!("usage increment failed for alias {}: {e}", alias.id);
        }

        Ok(AliasMatchResult::new(alias, match_type, confidence).with_vars(extracted))
    }
}
