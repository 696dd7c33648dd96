//! CLI command implementations.

mod config;
mod doctor;
mod index;
mod list;
mod prune;
mod search;
mod serve;

pub use config::run_config;
pub use doctor::run_doctor;
pub use index::run_index;
pub use list::run_list;
pub use prune::run_prune;
pub use search::run_search;
pub use serve::run_serve;

use crate::config::Settings;
use crate::embedding::HttpEmbedder;
use crate::error::Result;
use crate::vector_store::SqliteVectorStore;
use std::sync::Arc;

/// Open the configured store, which must already exist.
pub(crate) fn open_store(settings: &Settings) -> Result<Arc<SqliteVectorStore>> {
    let store = SqliteVectorStore::open(&settings.store_path(), &settings.vector_store.collection)?;
    Ok(Arc::new(store))
}

/// Open the configured store, creating it on first use.
pub(crate) fn open_or_create_store(settings: &Settings) -> Result<Arc<SqliteVectorStore>> {
    let store = SqliteVectorStore::open_or_create(
        &settings.store_path(),
        &settings.vector_store.collection,
    )?;
    Ok(Arc::new(store))
}

/// Build the embedding client from settings.
pub(crate) fn create_embedder(settings: &Settings) -> Result<Arc<HttpEmbedder>> {
    Ok(Arc::new(HttpEmbedder::with_config(&settings.embedding)?))
}
