//! Vector store abstraction for Sampledex.
//!
//! Provides a trait-based interface for different vector database backends.
//! Every backend ranks by cosine distance (`1 - cosine similarity`), so
//! lower scores mean closer matches.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::Result;
use crate::identity::SampleId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Default collection name inside a store directory.
pub const DEFAULT_COLLECTION: &str = "samples_library";

/// An indexed sample with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Canonical identity (primary key).
    pub identity: SampleId,
    /// Display name, the final path component.
    pub filename: Option<String>,
    /// Path used to open the file for preview.
    pub source_path: PathBuf,
    /// Embedding vector.
    pub vector: Vec<f32>,
    /// Duration reported by the metadata probe.
    pub duration_seconds: Option<f64>,
    /// When this record was written.
    pub indexed_at: DateTime<Utc>,
}

impl SampleRecord {
    /// Create a new record for a file.
    pub fn new(
        identity: SampleId,
        source_path: PathBuf,
        vector: Vec<f32>,
        duration_seconds: Option<f64>,
    ) -> Self {
        Self {
            filename: display_name(&source_path),
            identity,
            source_path,
            vector,
            duration_seconds,
            indexed_at: Utc::now(),
        }
    }

    /// Summary of this record without the vector.
    pub fn summary(&self) -> IndexedSample {
        IndexedSample {
            identity: self.identity.to_string(),
            filename: self.filename.clone(),
            source_path: self.source_path.to_string_lossy().into_owned(),
            duration_seconds: self.duration_seconds,
            indexed_at: self.indexed_at,
        }
    }
}

/// Summary information about an indexed sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSample {
    pub identity: String,
    pub filename: Option<String>,
    pub source_path: String,
    pub duration_seconds: Option<f64>,
    pub indexed_at: DateTime<Utc>,
}

/// A k-NN query match.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// Identity of the matched record.
    pub identity: String,
    /// Display name stored with the record, if any.
    pub filename: Option<String>,
    /// Cosine distance to the query (lower is closer).
    pub distance: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// All identities currently stored.
    async fn list_identities(&self) -> Result<HashSet<String>>;

    /// Insert or replace the record with the same identity.
    async fn upsert(&self, record: &SampleRecord) -> Result<()>;

    /// Up to `k` nearest records, closest first.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize>;

    /// Summaries of all stored records, ordered by identity.
    async fn list(&self) -> Result<Vec<IndexedSample>>;

    /// Remove a record. Returns whether it existed.
    async fn remove(&self, identity: &str) -> Result<bool>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Cosine distance in `[0, 2]`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Canonical result order: ascending distance, then identity.
///
/// NaN distances sort after every real distance.
pub fn rank_order(a: &Neighbor, b: &Neighbor) -> Ordering {
    let key = |n: &Neighbor| {
        if n.distance.is_nan() {
            f32::INFINITY
        } else {
            n.distance
        }
    };
    key(a)
        .total_cmp(&key(b))
        .then_with(|| a.identity.cmp(&b.identity))
}

/// Remove records whose source file no longer exists.
///
/// Returns the number of records removed.
#[instrument(skip(store))]
pub async fn prune_missing(store: &dyn VectorStore) -> Result<usize> {
    let mut removed = 0;
    for sample in store.list().await? {
        if Path::new(&sample.source_path).exists() {
            continue;
        }
        if store.remove(&sample.identity).await? {
            debug!("Pruned {}", sample.identity);
            removed += 1;
        }
    }
    info!("Pruned {} missing samples", removed);
    Ok(removed)
}

/// Display name for a path.
pub fn display_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}
