//! Alias domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Visibility scope for aliases and execution logs.
///
/// `Public` entries are visible to every requester; `Scoped` entries only to
/// requests made within the same scope (a tenant or user identifier).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Layer {
    Public,
    Scoped(String),
}

impl Layer {
    /// Parse a layer from its textual form; `"public"` maps to [`Layer::Public`].
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("public") {
            Layer::Public
        } else {
            Layer::Scoped(s.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Layer::Public => "public",
            Layer::Scoped(scope) => scope,
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Layer::Public)
    }

    /// Whether an entry in this layer is visible to a request made in
    /// `requested`: public entries always are, scoped entries only within
    /// the same scope.
    pub fn visible_from(&self, requested: &Layer) -> bool {
        self.is_public() || self == requested
    }
}

impl Default for Layer {
    fn default() -> Self {
        Layer::Public
    }
}

impl From<String> for Layer {
    fn from(s: String) -> Self {
        Layer::parse(&s)
    }
}

impl From<Layer> for String {
    fn from(layer: Layer) -> Self {
        layer.as_str().to_string()
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single step of an alias's action chain.
///
/// `params` values are literal JSON values; string values may embed `{path}`
/// tokens resolved at execution time against prior outputs and session
/// variables. `output`, if set, names this action's result for later steps.
/// `condition`, if set, guards the action: a false (or unparseable)
/// condition skips it without halting the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasAction {
    /// Name of the external capability to invoke
    pub tool: String,
    /// Parameter map; string values may contain `{path}` tokens
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
    /// Name under which this action's result becomes visible to later actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Boolean-expression guard; evaluated fail-closed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl AliasAction {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            params: serde_json::Map::new(),
            output: None,
            condition: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// A pattern-to-action-chain mapping used to route a natural-language request.
///
/// Created through the (external) admin surface; this core reads it, matches
/// against it, and increments its usage counter on successful matches. Never
/// mutated mid-execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alias {
    pub id: Uuid,
    /// Pattern string with `{name}` placeholders; placeholder names are
    /// unique within one pattern
    pub pattern: String,
    pub description: String,
    #[serde(default)]
    pub layer: Layer,
    /// Tags narrowing applicability; empty means always applicable
    #[serde(default)]
    pub context: Vec<String>,
    /// Optional execution mode hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Declared tool dependencies
    #[serde(default)]
    pub tools_required: Vec<String>,
    /// Ordered action chain
    #[serde(default)]
    pub actions: Vec<AliasAction>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub usage_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
    /// Embedding of the pattern, populated when semantic matching is indexed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_embedding: Option<Vec<f32>>,
}

fn default_enabled() -> bool {
    true
}

impl Alias {
    pub fn new(pattern: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pattern: pattern.into(),
            description: description.into(),
            layer: Layer::Public,
            context: Vec::new(),
            mode: None,
            tools_required: Vec::new(),
            actions: Vec::new(),
            priority: 0,
            enabled: true,
            usage_count: 0,
            last_used_at: None,
            pattern_embedding: None,
        }
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_context(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.context = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_action(mut self, action: AliasAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_tools_required(
        mut self,
        tools: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.tools_required = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether this alias applies to a request carrying `tags`.
    ///
    /// An alias with no context tags always applies; otherwise it must share
    /// at least one tag with the request.
    pub fn matches_context(&self, tags: &[String]) -> bool {
        self.context.is_empty() || self.context.iter().any(|t| tags.contains(t))
    }
}
