//! Alias value objects: match results produced by the resolver

use crate::alias::entities::Alias;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which resolution tier produced a match.
///
/// Tiers are tried strictly in this order; the first success wins and no
/// cross-tier ranking occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// The catalog reported an exact textual match (confidence 1.0)
    Exact,
    /// The catalog reported a similarity match (fixed confidence 0.8)
    Fuzzy,
    /// Nearest pattern by embedding cosine similarity (confidence = similarity)
    Semantic,
}

impl MatchType {
    pub fn as_str(&self) -> &str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Fuzzy => "fuzzy",
            MatchType::Semantic => "semantic",
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The outcome of one resolve call: at most one alias, the tier that found
/// it, the variables captured from the request, and a confidence score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasMatchResult {
    pub alias: Alias,
    pub match_type: MatchType,
    /// Placeholder name → captured substring; empty when the chosen pattern
    /// does not match the request textually (fuzzy/semantic tiers)
    pub extracted_vars: HashMap<String, String>,
    pub confidence: f64,
}

impl AliasMatchResult {
    pub fn new(alias: Alias, match_type: MatchType, confidence: f64) -> Self {
        Self {
            alias,
            match_type,
            extracted_vars: HashMap::new(),
            confidence,
        }
    }

    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.extracted_vars = vars;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_type_display() {
        assert_eq!(MatchType::Exact.to_string(), "exact");
        assert_eq!(MatchType::Fuzzy.to_string(), "fuzzy");
        assert_eq!(MatchType::Semantic.to_string(), "semantic");
    }

    #[test]
    fn test_match_type_serde() {
        assert_eq!(
            serde_json::to_string(&MatchType::Semantic).unwrap(),
            "\"semantic\""
        );
    }
}
