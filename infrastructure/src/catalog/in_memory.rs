use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;
use vocab_application::{
    AliasCatalog, CatalogError, CatalogMatch, CatalogMatchKind, EmbeddingError,
    EmbeddingProvider, SemanticCatalogMatch,
};
use vocab_domain::alias::entities::{Alias, Layer};
use vocab_domain::CompiledPattern;

use crate::embedding::cosine_similarity;

/// Minimum Jaro-Winkler similarity between the normalized request and a
/// pattern skeleton for a fuzzy hit.
const FUZZY_THRESHOLD: f64 = 0.82;

struct StoredAlias {
    alias: Alias,
    compiled: CompiledPattern,
    skeleton: String,
}

/// In-memory alias catalog.
///
/// Patterns are compiled once at insert time. Exact lookup runs the compiled
/// matcher; fuzzy lookup compares the normalized request against the pattern
/// skeleton (literals only) with Jaro-Winkler similarity; semantic lookup
/// ranks stored pattern embeddings by cosine similarity.
pub struct InMemoryAliasCatalog {
    aliases: RwLock<HashMap<Uuid, StoredAlias>>,
}

impl InMemoryAliasCatalog {
    pub fn new() -> Self {
        Self {
            aliases: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an alias, rejecting malformed patterns up front.
    pub fn insert(&self, alias: Alias) -> Result<Uuid, CatalogError> {
        let compiled = CompiledPattern::compile(&alias.pattern)
            .map_err(|e| CatalogError::InvalidPattern(e.to_string()))?;
        let skeleton = compiled.skeleton();
        let id = alias.id;
        let mut aliases = self
            .aliases
            .write()
            .map_err(|_| CatalogError::Lookup("catalog lock poisoned".to_string()))?;
        aliases.insert(
            id,
            StoredAlias {
                alias,
                compiled,
                skeleton,
            },
        );
        Ok(id)
    }

    pub fn insert_all(&self, aliases: Vec<Alias>) -> Result<usize, CatalogError> {
        let mut count = 0;
        for alias in aliases {
            self.insert(alias)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.aliases.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Computes and stores a pattern embedding for every alias that lacks
    /// one. Called once after loading a catalog file.
    pub async fn index_embeddings(
        &self,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<usize, EmbeddingError> {
        let pending: Vec<(Uuid, String)> = {
            let aliases = match self.aliases.read() {
                Ok(guard) => guard,
                Err(_) => return Ok(0),
            };
            aliases
                .values()
                .filter(|s| s.alias.pattern_embedding.is_none())
                .map(|s| (s.alias.id, s.alias.pattern.clone()))
                .collect()
        };

        let mut indexed = 0;
        for (id, pattern) in pending {
            let vector = embedder.embed(&pattern).await?;
            if let Ok(mut aliases) = self.aliases.write() {
                if let Some(stored) = aliases.get_mut(&id) {
                    stored.alias.pattern_embedding = Some(vector);
                    indexed += 1;
                }
            }
        }
        debug!(indexed, "Indexed pattern embeddings");
        Ok(indexed)
    }

    fn normalize(request: &str) -> String {
        request
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for InMemoryAliasCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn candidate(stored: &StoredAlias, layer: &Layer, context_tags: &[String]) -> bool {
    stored.alias.enabled
        && stored.alias.layer.visible_from(layer)
        && stored.alias.matches_context(context_tags)
}

#[async_trait]
impl AliasCatalog for InMemoryAliasCatalog {
    async fn find_alias(
        &self,
        request: &str,
        layer: &Layer,
        context_tags: &[String],
    ) -> Result<Option<CatalogMatch>, CatalogError> {
        let aliases = self
            .aliases
            .read()
            .map_err(|_| CatalogError::Lookup("catalog lock poisoned".to_string()))?;

        // Exact tier: the compiled pattern accepts the request
        let mut exact: Option<&StoredAlias> = None;
        for stored in aliases.values() {
            if !candidate(stored, layer, context_tags) {
                continue;
            }
            if stored.compiled.match_request(request).is_none() {
                continue;
            }
            let better = match exact {
                None => true,
                Some(current) => {
                    stored.alias.priority > current.alias.priority
                        || (stored.alias.priority == current.alias.priority
                            && stored.skeleton.len() > current.skeleton.len())
                }
            };
            if better {
                exact = Some(stored);
            }
        }
        if let Some(stored) = exact {
            debug!(alias_id = %stored.alias.id, "Exact catalog match");
            return Ok(Some(CatalogMatch {
                alias: stored.alias.clone(),
                kind: CatalogMatchKind::Exact,
            }));
        }

        // Fuzzy tier: Jaro-Winkler over the pattern skeleton
        let normalized = Self::normalize(request);
        if normalized.is_empty() {
            return Ok(None);
        }
        let mut best: Option<(&StoredAlias, f64)> = None;
        for stored in aliases.values() {
            if !candidate(stored, layer, context_tags) || stored.skeleton.is_empty() {
                continue;
            }
            let score = strsim::jaro_winkler(&normalized, &stored.skeleton);
            if score < FUZZY_THRESHOLD {
                continue;
            }
            let better = match best {
                None => true,
                Some((current, current_score)) => {
                    score > current_score
                        || (score == current_score
                            && stored.alias.priority > current.alias.priority)
                }
            };
            if better {
                best = Some((stored, score));
            }
        }
        if let Some((stored, score)) = best {
            debug!(alias_id = %stored.alias.id, score, "Fuzzy catalog match");
            return Ok(Some(CatalogMatch {
                alias: stored.alias.clone(),
                kind: CatalogMatchKind::Fuzzy,
            }));
        }

        Ok(None)
    }

    async fn find_alias_semantic(
        &self,
        embedding: &[f32],
        layer: &Layer,
        threshold: f64,
        limit: usize,
    ) -> Result<Option<SemanticCatalogMatch>, CatalogError> {
        if limit == 0 {
            return Ok(None);
        }
        let aliases = self
            .aliases
            .read()
            .map_err(|_| CatalogError::Lookup("catalog lock poisoned".to_string()))?;

        // The semantic tier is scoped by layer only; context tags narrow
        // the textual lookup, not the vector search
        let mut scored: Vec<(&StoredAlias, f64)> = aliases
            .values()
            .filter(|s| s.alias.enabled && s.alias.layer.visible_from(layer))
            .filter_map(|s| {
                s.alias
                    .pattern_embedding
                    .as_ref()
                    .map(|v| (s, cosine_similarity(embedding, v)))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        let hit = scored
            .into_iter()
            .find(|(_, similarity)| *similarity >= threshold);
        Ok(hit.map(|(stored, similarity)| {
            debug!(alias_id = %stored.alias.id, similarity, "Semantic catalog match");
            SemanticCatalogMatch {
                alias: stored.alias.clone(),
                similarity,
            }
        }))
    }

    async fn increment_usage(&self, alias_id: Uuid) -> Result<(), CatalogError> {
        let mut aliases = self
            .aliases
            .write()
            .map_err(|_| CatalogError::Lookup("catalog lock poisoned".to_string()))?;
        let stored = aliases
            .get_mut(&alias_id)
            .ok_or(CatalogError::NotFound(alias_id))?;
        stored.alias.usage_count += 1;
        stored.alias.last_used_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::hashed::HashedTrigramEmbedder;

    fn alias(pattern: &str) -> Alias {
        Alias::new(pattern, "test alias")
    }

    #[tokio::test]
    async fn exact_match_wins_over_fuzzy() {
        let catalog = InMemoryAliasCatalog::new();
        catalog.insert(alias("tie a string to {person}")).unwrap();
        catalog.insert(alias("tie a string around {thing}")).unwrap();

        let hit = catalog
            .find_alias("tie a string to Alice", &Layer::Public, &[])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.kind, CatalogMatchKind::Exact);
        assert_eq!(hit.alias.pattern, "tie a string to {person}");
    }

    #[tokio::test]
    async fn typo_lands_in_fuzzy_tier() {
        let catalog = InMemoryAliasCatalog::new();
        catalog.insert(alias("remember this meeting")).unwrap();

        let hit = catalog
            .find_alias("remember this meting", &Layer::Public, &[])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.kind, CatalogMatchKind::Fuzzy);
    }

    #[tokio::test]
    async fn unrelated_request_matches_nothing() {
        let catalog = InMemoryAliasCatalog::new();
        catalog.insert(alias("remember this meeting")).unwrap();

        let hit = catalog
            .find_alias("deploy the staging cluster", &Layer::Public, &[])
            .await
            .unwrap();
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn disabled_aliases_are_invisible() {
        let catalog = InMemoryAliasCatalog::new();
        let mut a = alias("remember this meeting");
        a.enabled = false;
        catalog.insert(a).unwrap();

        let hit = catalog
            .find_alias("remember this meeting", &Layer::Public, &[])
            .await
            .unwrap();
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn scoped_alias_hidden_from_public_layer() {
        let catalog = InMemoryAliasCatalog::new();
        let mut a = alias("remember this meeting");
        a.layer = Layer::Scoped("sales".to_string());
        catalog.insert(a).unwrap();

        let from_public = catalog
            .find_alias("remember this meeting", &Layer::Public, &[])
            .await
            .unwrap();
        assert!(from_public.is_none());

        let from_sales = catalog
            .find_alias(
                "remember this meeting",
                &Layer::Scoped("sales".to_string()),
                &[],
            )
            .await
            .unwrap();
        assert!(from_sales.is_some());
    }

    #[tokio::test]
    async fn context_tags_narrow_candidates() {
        let catalog = InMemoryAliasCatalog::new();
        let mut a = alias("sync {item}");
        a.context = vec!["crm".to_string()];
        catalog.insert(a).unwrap();

        let no_tags = catalog
            .find_alias("sync contacts", &Layer::Public, &["email".to_string()])
            .await
            .unwrap();
        assert!(no_tags.is_none());

        let tagged = catalog
            .find_alias("sync contacts", &Layer::Public, &["crm".to_string()])
            .await
            .unwrap();
        assert!(tagged.is_some());
    }

    #[tokio::test]
    async fn priority_breaks_exact_ties() {
        let catalog = InMemoryAliasCatalog::new();
        let low = alias("ping {target}");
        catalog.insert(low).unwrap();
        let mut high = alias("ping {host}");
        high.priority = 5;
        let high_id = catalog.insert(high).unwrap();

        let hit = catalog
            .find_alias("ping server1", &Layer::Public, &[])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.alias.id, high_id);
    }

    #[tokio::test]
    async fn malformed_pattern_is_rejected_at_insert() {
        let catalog = InMemoryAliasCatalog::new();
        let err = catalog.insert(alias("move {a}{b}")).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPattern(_)));
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn semantic_search_ranks_by_similarity() {
        let catalog = InMemoryAliasCatalog::new();
        catalog.insert(alias("tie a string to {person}")).unwrap();
        catalog.insert(alias("forecast quarterly revenue")).unwrap();
        let embedder = HashedTrigramEmbedder::default();
        catalog.index_embeddings(&embedder).await.unwrap();

        let query = embedder.embed("tie a string to {person}").await.unwrap();
        let hit = catalog
            .find_alias_semantic(&query, &Layer::Public, 0.5, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.alias.pattern, "tie a string to {person}");
        assert!(hit.similarity > 0.9);
    }

    #[tokio::test]
    async fn semantic_search_includes_context_tagged_aliases() {
        let catalog = InMemoryAliasCatalog::new();
        let mut tagged = alias("sync crm contacts");
        tagged.context = vec!["crm".to_string()];
        catalog.insert(tagged).unwrap();
        let embedder = HashedTrigramEmbedder::default();
        catalog.index_embeddings(&embedder).await.unwrap();

        // Context tags narrow only the textual lookup; a tagged alias stays
        // reachable through the vector search
        let query = embedder.embed("sync crm contacts").await.unwrap();
        let hit = catalog
            .find_alias_semantic(&query, &Layer::Public, 0.5, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.alias.pattern, "sync crm contacts");
        assert!(hit.similarity > 0.9);
    }

    #[tokio::test]
    async fn semantic_search_respects_threshold() {
        let catalog = InMemoryAliasCatalog::new();
        catalog.insert(alias("forecast quarterly revenue")).unwrap();
        let embedder = HashedTrigramEmbedder::default();
        catalog.index_embeddings(&embedder).await.unwrap();

        let query = embedder.embed("water the office plants").await.unwrap();
        let hit = catalog
            .find_alias_semantic(&query, &Layer::Public, 0.95, 1)
            .await
            .unwrap();
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn increment_usage_updates_counter() {
        let catalog = InMemoryAliasCatalog::new();
        let id = catalog.insert(alias("remember {item}")).unwrap();

        catalog.increment_usage(id).await.unwrap();
        catalog.increment_usage(id).await.unwrap();

        let hit = catalog
            .find_alias("remember lunch", &Layer::Public, &[])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.alias.usage_count, 2);
        assert!(hit.alias.last_used_at.is_some());
    }

    #[tokio::test]
    async fn increment_usage_for_unknown_id_fails() {
        let catalog = InMemoryAliasCatalog::new();
        let err = catalog.increment_usage(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }
}
