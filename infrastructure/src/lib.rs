//! Infrastructure layer for vocab-router
//!
//! Adapters behind the application ports: the in-memory alias catalog with
//! exact/fuzzy/semantic lookup, the JSONL execution log store, the offline
//! hashed-trigram embedder, the echo tool invoker, and configuration
//! loading.

pub mod catalog;
pub mod config;
pub mod embedding;
pub mod log_store;
pub mod tools;

// Re-export commonly used types
pub use catalog::file::{load_catalog_file, CatalogFileError};
pub use catalog::in_memory::InMemoryAliasCatalog;
pub use config::{ConfigLoader, FileConfig};
pub use embedding::hashed::HashedTrigramEmbedder;
pub use log_store::jsonl::JsonlExecutionLogStore;
pub use tools::echo::EchoToolInvoker;
