//! Use cases: the four operations this core exposes
//!
//! - [`resolve_request`]: match a free-text request to one alias
//! - [`run_chain`]: execute a matched alias's action chain
//! - [`record_execution`]: build and persist the audit record
//! - [`recall`]: search past executions

pub mod recall;
pub mod record_execution;
pub mod resolve_request;
pub mod run_chain;
