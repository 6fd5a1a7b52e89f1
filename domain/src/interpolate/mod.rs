//! Variable interpolation: `{path}` token resolution for action params.
//!
//! Two modes, chosen per parameter value:
//!
//! - A value that is exactly one `{path}` token resolves to the referenced
//!   value with its original JSON type intact (number, bool, object, array).
//! - Anything else is a template: every `{path}` occurrence is replaced by
//!   the string form of the resolved value, and unresolved paths render as
//!   empty string.
//!
//! Resolution walks the merged execution scope in which step outputs shadow
//! session variables; dotted segments navigate nested objects, and
//! navigating through a non-object short-circuits to nothing.

use serde_json::Value;

/// Resolve a dotted path against a JSON scope object.
///
/// Returns `None` when any segment is missing or traversal hits a
/// non-object before the path is exhausted.
pub fn resolve_path(path: &str, scope: &Value) -> Option<Value> {
    let mut current = scope;
    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }
        current = current.as_object()?.get(segment)?;
    }
    Some(current.clone())
}

/// Interpolate one action parameter value against the execution scope.
///
/// String values go through token resolution; non-string values pass
/// through untouched.
pub fn interpolate_param(param: &Value, scope: &Value) -> Value {
    match param {
        Value::String(s) => interpolate_str(s, scope),
        other => other.clone(),
    }
}

fn interpolate_str(s: &str, scope: &Value) -> Value {
    if let Some(path) = single_token(s) {
        // Full-token mode: preserve the referenced value's type
        return resolve_path(path, scope).unwrap_or(Value::Null);
    }
    Value::String(interpolate_template(s, scope))
}

/// Template mode: replace every `{path}` occurrence with the string form of
/// the resolved value. Unresolved paths render as empty string; a `{` with
/// no closing brace is left as-is.
pub fn interpolate_template(template: &str, scope: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) => {
                let path = &after_open[..close];
                if let Some(value) = resolve_path(path, scope) {
                    out.push_str(&render(&value));
                }
                rest = &after_open[close + 1..];
            }
            None => {
                // Unterminated token: emit the rest literally
                out.push('{');
                rest = after_open;
                break;
            }
        }
    }

    out.push_str(rest);
    out
}

/// The string form of a value for template substitution: strings unquoted,
/// null empty, everything else compact JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// If `s` is exactly one `{path}` token (no surrounding text, no nested
/// braces), return the inner path.
fn single_token(s: &str) -> Option<&str> {
    let inner = s.strip_prefix('{')?.strip_suffix('}')?;
    if inner.is_empty() || inner.contains('{') || inner.contains('}') {
        return None;
    }
    Some(inner)
}
