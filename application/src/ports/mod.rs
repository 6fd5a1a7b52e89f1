//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod alias_catalog;
pub mod embedding;
pub mod log_store;
pub mod tool_invoker;
