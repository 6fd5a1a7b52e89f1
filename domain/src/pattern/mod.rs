//! Pattern compilation and matching

pub mod compiler;

pub use compiler::{CompiledPattern, PatternError, Segment};
