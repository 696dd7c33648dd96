//! Configuration settings for Sampledex.

use crate::error::{Result, SampledexError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub vector_store: VectorStoreSettings,
    pub search: SearchSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Embedding inference service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Base URL of the inference service.
    pub endpoint: String,
    /// Model served by the endpoint (informational).
    pub model: String,
    /// Expected vector length. 0 accepts whatever the service returns.
    pub dimensions: u32,
    /// Sample rate the model expects for audio input.
    pub sample_rate: u32,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8765".to_string(),
            model: "laion/clap-htsat-unfused".to_string(),
            dimensions: 512,
            sample_rate: 48_000,
            timeout_seconds: 120,
        }
    }
}

/// Corpus indexing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Longest sample admitted into the index, in seconds.
    pub max_duration_seconds: f64,
    /// File extensions treated as audio (case-insensitive, no dot).
    pub extensions: Vec<String>,
    /// Number of files embedded concurrently.
    pub concurrency: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            max_duration_seconds: 10.0,
            extensions: crate::scanner::DEFAULT_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            concurrency: 1,
        }
    }
}

impl IndexSettings {
    /// The duration limit as a `Duration`.
    pub fn max_duration(&self) -> Result<Duration> {
        parse_duration_limit(self.max_duration_seconds)
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Directory holding the store.
    pub path: String,
    /// Name of the collection inside the store directory.
    pub collection: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            path: "~/.sampledex/sample_db".to_string(),
            collection: "samples_library".to_string(),
        }
    }
}

/// Search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Default number of results.
    pub top_k: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Results returned by `POST /search` when the request omits `top_k`.
    pub top_k: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            top_k: 3,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = Self::config_path(path.map(PathBuf::as_path));

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SampledexError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sampledex")
            .join("config.toml")
    }

    /// The config file in effect: an explicit path if given, else the default.
    pub fn config_path(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path)
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded vector store directory.
    pub fn store_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.path)
    }
}

/// Validate a duration limit given in seconds.
pub fn parse_duration_limit(seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds).map_err(|_| {
        SampledexError::Config(format!(
            "max duration must be a non-negative number of seconds, got {}",
            seconds
        ))
    })
}
