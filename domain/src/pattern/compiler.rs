//! Pattern compiler: parses `{name}` placeholder patterns and matches
//! candidate strings against them.
//!
//! A pattern like `"tie a string to {person} after {event}"` compiles into an
//! ordered list of literal and placeholder segments. Matching anchors the
//! whole candidate case-insensitively and captures one substring per
//! placeholder (trimmed, non-empty).
//!
//! Round-trip guarantee: for any pattern whose adjacent placeholders are
//! separated by at least one literal character, substituting arbitrary
//! non-empty brace-free values and matching the result recovers exactly those
//! values. Patterns with zero-separation adjacent placeholders (`"{a}{b}"`)
//! make the capture split ambiguous and are rejected at compile time.

use std::collections::HashMap;
use thiserror::Error;

/// Errors raised when compiling a pattern string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("adjacent placeholders '{{{0}}}{{{1}}}' have no separating literal")]
    AdjacentPlaceholders(String, String),

    #[error("duplicate placeholder name: {0}")]
    DuplicatePlaceholder(String),

    #[error("unclosed placeholder starting at offset {0}")]
    UnclosedPlaceholder(usize),

    #[error("empty placeholder at offset {0}")]
    EmptyPlaceholder(usize),

    #[error("invalid placeholder name '{0}': only alphanumerics and '_' are allowed")]
    InvalidPlaceholderName(String),

    #[error("unexpected '}}' at offset {0}")]
    UnexpectedCloseBrace(usize),

    #[error("pattern is empty")]
    Empty,
}

/// One compiled pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A compiled alias pattern: ordered segments plus an anchored matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    pattern: String,
    segments: Vec<Segment>,
}

impl CompiledPattern {
    /// Compile a pattern string into segments, validating placeholder use.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut segments: Vec<Segment> = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.char_indices().peekable();

        while let Some((offset, ch)) = chars.next() {
            match ch {
                '{' => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }

                    let mut name = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        name.push(inner);
                    }

                    if !closed {
                        return Err(PatternError::UnclosedPlaceholder(offset));
                    }
                    if name.is_empty() {
                        return Err(PatternError::EmptyPlaceholder(offset));
                    }
                    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                        return Err(PatternError::InvalidPlaceholderName(name));
                    }
                    if seen.contains(&name) {
                        return Err(PatternError::DuplicatePlaceholder(name));
                    }
                    if let Some(Segment::Placeholder(prev)) = segments.last() {
                        return Err(PatternError::AdjacentPlaceholders(prev.clone(), name));
                    }

                    seen.push(name.clone());
                    segments.push(Segment::Placeholder(name));
                }
                '}' => return Err(PatternError::UnexpectedCloseBrace(offset)),
                _ => literal.push(ch),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholder names in declaration order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// The pattern's literal text with placeholders removed and whitespace
    /// collapsed, lowercased. Catalog adapters use this as the similarity
    /// target for fuzzy lookups.
    pub fn skeleton(&self) -> String {
        let literals: String = self
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Literal(text) => Some(text.as_str()),
                Segment::Placeholder(_) => None,
            })
            .collect::<Vec<_>>()
            .join(" ");

        literals.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
    }

    /// Substitute placeholder values back into the pattern. Missing values
    /// render as empty. Mostly useful for tests and catalog seeding.
    pub fn substitute(&self, vars: &HashMap<String, String>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    if let Some(value) = vars.get(name) {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }

    /// Match a candidate string against the pattern.
    ///
    /// The whole candidate is anchored: leading literal, inter-placeholder
    /// literals, and trailing text must all line up (case-insensitively).
    /// Each placeholder captures the shortest non-empty span up to the next
    /// literal; captures are trimmed and must remain non-empty.
    ///
    /// Returns `None` when the candidate does not fit the pattern.
    pub fn match_request(&self, candidate: &str) -> Option<HashMap<String, String>> {
        let chars: Vec<char> = candidate.chars().collect();
        let mut vars = HashMap::new();
        let mut pos = 0usize;

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(lit) => {
                    let lit_chars: Vec<char> = lit.chars().collect();
                    if !starts_with_ci(&chars, pos, &lit_chars) {
                        return None;
                    }
                    pos += lit_chars.len();
                }
                Segment::Placeholder(name) => {
                    let end = match self.segments.get(i + 1) {
                        Some(Segment::Literal(next)) => {
                            let next_chars: Vec<char> = next.chars().collect();
                            // Shortest match, preferring a non-empty capture
                            find_ci(&chars, pos + 1, &next_chars)
                                .or_else(|| find_ci(&chars, pos, &next_chars))?
                        }
                        // Compile rejects adjacent placeholders, so the only
                        // other case is a trailing placeholder
                        _ => chars.len(),
                    };

                    let captured: String = chars[pos..end].iter().collect();
                    let trimmed = captured.trim();
                    if trimmed.is_empty() {
                        return None;
                    }
                    vars.insert(name.clone(), trimmed.to_string());
                    pos = end;
                }
            }
        }

        if pos == chars.len() {
            Some(vars)
        } else {
            None
        }
    }
}

fn chars_eq_ci(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

fn starts_with_ci(haystack: &[char], at: usize, needle: &[char]) -> bool {
    haystack.len() >= at + needle.len()
        && needle
            .iter()
            .zip(&haystack[at..])
            .all(|(n, h)| chars_eq_ci(*n, *h))
}

/// First index >= `from` where `needle` occurs in `haystack`, ignoring case.
fn find_ci(haystack: &[char], from: usize, needle: &[char]) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    (from..=haystack.len().saturating_sub(needle.len()))
        .find(|&i| starts_with_ci(haystack, i, needle))
}
