//! Application layer for vocab-router
//!
//! This crate contains use cases, port definitions, and match configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::MatchConfig;
pub use ports::{
    alias_catalog::{AliasCatalog, CatalogError, CatalogMatch, CatalogMatchKind, SemanticCatalogMatch},
    embedding::{EmbeddingError, EmbeddingProvider},
    log_store::{ExecutionLogStore, LogStoreError, RecallFilter},
    tool_invoker::ToolInvoker,
};
pub use use_cases::recall::{RecallOptions, RecallUseCase};
pub use use_cases::record_execution::{
    EntityExtractor, RecordExecutionInput, RecordExecutionUseCase, Summarizer,
};
pub use use_cases::resolve_request::{ResolveError, ResolveRequestUseCase};
pub use use_cases::run_chain::{RunChainInput, RunChainUseCase};
