mod file_config;
mod loader;

pub use file_config::{CatalogSection, FileConfig, LogSection, MatchSection};
pub use loader::ConfigLoader;
