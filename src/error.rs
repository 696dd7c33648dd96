//! Error types for Sampledex.

use std::path::PathBuf;
use thiserror::Error;

/// Library-level error type for Sampledex operations.
#[derive(Error, Debug)]
pub enum SampledexError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not read audio metadata: {0}")]
    Probe(String),

    #[error("Audio decode failed: {0}")]
    Decode(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store unavailable at {}: {reason}", path.display())]
    StoreUnavailable { path: PathBuf, reason: String },

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl SampledexError {
    /// Whether this error means the vector store could not be opened at all.
    ///
    /// Shells use this to fall back to an "unindexed" state instead of failing.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, SampledexError::StoreUnavailable { .. })
    }
}

/// Result type alias for Sampledex operations.
pub type Result<T> = std::result::Result<T, SampledexError>;
