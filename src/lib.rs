//! Sampledex - natural-language search for audio samples
//!
//! A local-first tool for indexing folders of short audio samples and
//! finding them again by describing how they sound.
//!
//! # Overview
//!
//! Sampledex allows you to:
//! - Scan a folder tree for audio files under a duration limit
//! - Embed each file with a joint audio/text model served over HTTP
//! - Persist the vectors in a local store keyed by absolute path
//! - Rank stored samples against a text description
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `identity` - Path normalization and sample identity
//! - `audio` - Duration probing and decoding
//! - `scanner` - Folder traversal and work item selection
//! - `embedding` - Embedding inference client
//! - `vector_store` - Vector database abstraction
//! - `indexer` - Indexing pipeline with progress and cancellation
//! - `search` - Text query engine
//!
//! # Example
//!
//! ```rust,no_run
//! use sampledex::config::Settings;
//! use sampledex::embedding::HttpEmbedder;
//! use sampledex::indexer::Indexer;
//! use sampledex::search::QueryEngine;
//! use sampledex::vector_store::SqliteVectorStore;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let embedder = Arc::new(HttpEmbedder::with_config(&settings.embedding)?);
//!     let store = Arc::new(SqliteVectorStore::open_or_create(
//!         &settings.store_path(),
//!         &settings.vector_store.collection,
//!     )?);
//!
//!     let indexer = Indexer::from_settings(&settings, embedder.clone(), store.clone())?;
//!     let added = indexer
//!         .run_indexing(Path::new("/samples"), |p| println!("{}%", p.percent()))
//!         .await?;
//!     println!("Indexed {} samples", added);
//!
//!     let engine = QueryEngine::new(embedder, store);
//!     for hit in engine.search("short punchy kick", 5).await? {
//!         println!("{} ({:.3})", hit.route, hit.score);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod identity;
pub mod indexer;
pub mod scanner;
pub mod search;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, SampledexError};
