//! Configuration loading for DrillTag workers
//!
//! Resolution priority per key: environment variable → TOML config file →
//! compiled default. The config file is looked up at `$DRILLTAG_CONFIG`,
//! falling back to the platform config directory
//! (e.g. `~/.config/drilltag/config.toml`). A missing file is not an
//! error; an unparseable one is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Inference endpoint settings (Ollama-compatible HTTP API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL of the inference server
    pub endpoint: String,
    /// Model name passed in each generate request
    pub model: String,
    /// Sampling temperature; kept low since tagging is classification
    pub temperature: f64,
    pub top_p: f64,
    /// Context window passed to the model
    pub num_ctx: u32,
    /// Request timeout; a slow endpoint must not stall the worker
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
            temperature: 0.1,
            top_p: 0.9,
            num_ctx: 4096,
            timeout_secs: 30,
        }
    }
}

/// Worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database path; defaults to the platform data directory
    pub database_path: Option<PathBuf>,
    /// Port for the health/status HTTP surface
    pub http_port: u16,
    /// Event bus channel capacity
    pub event_capacity: usize,
    pub ollama: OllamaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            http_port: 5741,
            event_capacity: 256,
            ollama: OllamaConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration: TOML file (if present) with environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match config_file_path() {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?
            }
            _ => Config::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `DRILLTAG_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("DRILLTAG_DATABASE_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Ok(port) = std::env::var("DRILLTAG_HTTP_PORT") {
            if let Ok(port) = port.parse() {
                self.http_port = port;
            } else {
                tracing::warn!("Ignoring invalid DRILLTAG_HTTP_PORT: {}", port);
            }
        }
        if let Ok(endpoint) = std::env::var("DRILLTAG_OLLAMA_ENDPOINT") {
            self.ollama.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var("DRILLTAG_OLLAMA_MODEL") {
            self.ollama.model = model;
        }
    }

    /// Resolve the database path, falling back to the platform default
    pub fn resolve_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// Config file location: `$DRILLTAG_CONFIG` or the platform config dir
fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("DRILLTAG_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("drilltag").join("config.toml"))
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("drilltag").join("drilltag.db"))
        .unwrap_or_else(|| PathBuf::from("./drilltag_data/drilltag.db"))
}
