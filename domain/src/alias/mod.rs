//! Alias model: pattern-to-action-chain mappings and match results

pub mod entities;
pub mod value_objects;

pub use entities::{Alias, AliasAction, Layer};
pub use value_objects::{AliasMatchResult, MatchType};
