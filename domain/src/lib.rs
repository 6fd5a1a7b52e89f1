//! Domain layer for vocab-router
//!
//! This crate contains the core routing logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Vocabulary as API
//!
//! A free-text request is routed by matching it against a catalog of
//! parametrized alias patterns. A matched alias carries an ordered action
//! chain: each action names an external tool, parameters that may reference
//! prior outputs or session variables, and an optional guard condition.
//!
//! ## Purity
//!
//! Pattern compilation, condition evaluation, and interpolation are
//! synchronous and side-effect free. Anything that suspends (catalog lookup,
//! tool invocation, embedding, log persistence) lives behind application
//! ports.

pub mod alias;
pub mod condition;
pub mod core;
pub mod execution;
pub mod interpolate;
pub mod pattern;

// Re-export commonly used types
pub use alias::{
    entities::{Alias, AliasAction, Layer},
    value_objects::{AliasMatchResult, MatchType},
};
pub use condition::evaluate;
pub use core::string::{slugify, truncate};
pub use execution::{
    entities::{
        ExecutionContext, ExecutionLog, ExecutionResult, ExecutionStep, NewExecutionLog,
        StepOutcome,
    },
    output::{ToolError, ToolOutput},
    summary::{default_summary, extract_entities},
};
pub use interpolate::{interpolate_param, interpolate_template, resolve_path};
pub use pattern::{CompiledPattern, PatternError, Segment};
