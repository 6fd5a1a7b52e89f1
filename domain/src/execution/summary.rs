//! Default result summarization and entity extraction.

use crate::core::string::{slugify, truncate};
use crate::execution::entities::{ExecutionStep, StepOutcome};
use std::collections::HashMap;

const SUMMARY_MAX_LEN: usize = 300;

/// Variable names whose values are treated as recall entities.
const ENTITY_VARS: &[&str] = &["person", "contact", "company", "project", "client", "name"];

/// Build the default result summary for a completed run.
///
/// Failure message when the run failed; otherwise the last completed step's
/// textual result (or its structured `message` field); otherwise a count of
/// completed actions; otherwise a fixed no-op phrase.
pub fn default_summary(
    steps: &[ExecutionStep],
    success: bool,
    error_message: Option<&str>,
) -> String {
    if !success {
        return error_message.unwrap_or("Execution failed").to_string();
    }

    let completed: Vec<&ExecutionStep> = steps
        .iter()
        .filter(|s| s.outcome.is_completed())
        .collect();

    if let Some(last) = completed.last() {
        if let StepOutcome::Completed { result } = &last.outcome {
            if let Some(message) = result.message() {
                if !message.trim().is_empty() {
                    return truncate(message.trim(), SUMMARY_MAX_LEN);
                }
            }
        }
        return format!("Completed {} action(s)", completed.len());
    }

    "No actions executed".to_string()
}

/// Extract slugged recall entities from the run's variables.
///
/// Picks the well-known entity variable names, slugs their values, and
/// drops duplicates while preserving first-seen order.
pub fn extract_entities(vars: &HashMap<String, String>) -> Vec<String> {
    let mut entities = Vec::new();
    for key in ENTITY_VARS {
        if let Some(value) = vars.get(*key) {
            let slug = slugify(value);
            if !slug.is_empty() && !entities.contains(&slug) {
                entities.push(slug);
            }
        }
    }
    entities
}
