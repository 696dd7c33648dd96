//! Free-text search over indexed samples.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{rank_order, Neighbor, VectorStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// A ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Display name, absent when the record has none.
    pub filename: Option<String>,
    /// Sample identity, which is also the path to open it.
    pub route: String,
    /// Cosine distance to the query (lower is better).
    pub score: f32,
}

impl From<Neighbor> for SearchHit {
    fn from(neighbor: Neighbor) -> Self {
        Self {
            filename: neighbor.filename,
            route: neighbor.identity,
            score: neighbor.distance,
        }
    }
}

/// Turns text queries into ranked sample lists.
pub struct QueryEngine {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
}

impl QueryEngine {
    /// Create a new query engine.
    pub fn new(embedder: Arc<dyn Embedder>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            vector_store,
        }
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Find the `top_k` samples closest to `query`, best first.
    ///
    /// Blank queries return no results without touching the model. Ties
    /// in distance are ordered by route so repeated searches agree.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let indexed = self.vector_store.count().await?;
        let k = top_k.min(indexed);
        if k == 0 {
            debug!("Index is empty");
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_text(query).await?;
        let mut neighbors = self.vector_store.query(&query_vector, k).await?;

        if !neighbors.windows(2).all(|w| rank_order(&w[0], &w[1]).is_le()) {
            debug!("Store returned neighbors out of order, re-ranking");
        }
        neighbors.sort_by(rank_order);
        neighbors.truncate(k);

        debug!("Returning {} results", neighbors.len());
        Ok(neighbors.into_iter().map(SearchHit::from).collect())
    }
}
