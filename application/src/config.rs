//! Match configuration

/// Tuning for the resolver's semantic tier.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Whether the semantic tier runs at all (it also requires a configured
    /// embedding provider)
    pub semantic_enabled: bool,
    /// Minimum cosine similarity for a semantic candidate to be accepted
    pub semantic_threshold: f64,
    /// Candidate window for the vector search; only the top candidate is
    /// ever returned
    pub semantic_limit: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            semantic_enabled: true,
            semantic_threshold: 0.78,
            semantic_limit: 1,
        }
    }
}

impl MatchConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.semantic_threshold = threshold;
        self
    }

    pub fn without_semantic(mut self) -> Self {
        self.semantic_enabled = false;
        self
    }
}
