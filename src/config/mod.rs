//! Configuration module for Sampledex.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    parse_duration_limit, EmbeddingSettings, GeneralSettings, IndexSettings, SearchSettings,
    ServerSettings, Settings, VectorStoreSettings,
};
