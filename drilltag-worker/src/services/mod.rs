//! Classification services for the tagging worker

pub mod drill_builder;
pub mod fallback;
pub mod ollama_client;

pub use ollama_client::{ClassifierError, OllamaClient};
