//! Configuration file structure

use serde::{Deserialize, Serialize};
use vocab_application::MatchConfig;

/// Top-level configuration, merged from defaults and TOML files.
///
/// ```toml
/// [match]
/// semantic_enabled = true
/// semantic_threshold = 0.78
///
/// [catalog]
/// path = "vocab-catalog.toml"
///
/// [log]
/// path = "vocab-executions.jsonl"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    #[serde(rename = "match")]
    pub matching: MatchSection,
    pub catalog: CatalogSection,
    pub log: LogSection,
}

/// `[match]` section: match-tier tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSection {
    pub semantic_enabled: bool,
    pub semantic_threshold: f64,
    pub semantic_limit: usize,
}

impl Default for MatchSection {
    fn default() -> Self {
        let defaults = MatchConfig::default();
        Self {
            semantic_enabled: defaults.semantic_enabled,
            semantic_threshold: defaults.semantic_threshold,
            semantic_limit: defaults.semantic_limit,
        }
    }
}

/// `[catalog]` section: where alias definitions are loaded from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    pub path: Option<String>,
}

/// `[log]` section: execution log location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub path: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            path: "vocab-executions.jsonl".to_string(),
        }
    }
}

impl FileConfig {
    /// Project the `[match]` section into the application-layer config.
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            semantic_enabled: self.matching.semantic_enabled,
            semantic_threshold: self.matching.semantic_threshold,
            semantic_limit: self.matching.semantic_limit,
        }
    }
}
