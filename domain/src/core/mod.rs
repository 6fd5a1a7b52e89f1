//! Shared domain primitives

pub mod string;
