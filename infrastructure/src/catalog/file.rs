use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;
use vocab_domain::alias::entities::{Alias, AliasAction, Layer};

#[derive(Error, Debug)]
pub enum CatalogFileError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// On-disk alias catalog.
///
/// ```toml
/// [[alias]]
/// pattern = "tie a string to {person} after {event}"
/// description = "Create a follow-up reminder"
///
/// [[alias.actions]]
/// tool = "searchContacts"
/// params = { query = "{person}" }
/// output = "contact"
/// ```
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "alias")]
    aliases: Vec<AliasDef>,
}

#[derive(Debug, Deserialize)]
struct AliasDef {
    pattern: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    layer: Option<String>,
    #[serde(default)]
    context: Vec<String>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    tools_required: Vec<String>,
    #[serde(default)]
    actions: Vec<ActionDef>,
    #[serde(default)]
    priority: i32,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct ActionDef {
    tool: String,
    #[serde(default)]
    params: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    condition: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl From<AliasDef> for Alias {
    fn from(def: AliasDef) -> Self {
        let mut alias = Alias::new(def.pattern, def.description);
        if let Some(id) = def.id {
            alias.id = id;
        }
        if let Some(layer) = def.layer {
            alias.layer = Layer::parse(&layer);
        }
        alias.context = def.context;
        alias.mode = def.mode;
        alias.tools_required = def.tools_required;
        alias.priority = def.priority;
        alias.enabled = def.enabled;
        alias.actions = def
            .actions
            .into_iter()
            .map(|a| AliasAction {
                tool: a.tool,
                params: a.params,
                output: a.output,
                condition: a.condition,
            })
            .collect();
        alias
    }
}

/// Loads alias definitions from a TOML catalog file.
pub fn load_catalog_file(path: impl AsRef<Path>) -> Result<Vec<Alias>, CatalogFileError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let file: CatalogFile = toml::from_str(&contents)?;
    debug!(
        path = %path.as_ref().display(),
        count = file.aliases.len(),
        "Loaded alias catalog"
    );
    Ok(file.aliases.into_iter().map(Alias::from).collect())
}
