//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{cosine_distance, rank_order, IndexedSample, Neighbor, SampleRecord, VectorStore};
use crate::error::{Result, SampledexError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

/// In-memory vector store.
pub struct MemoryVectorStore {
    records: RwLock<HashMap<String, SampleRecord>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, SampleRecord>>> {
        self.records
            .read()
            .map_err(|e| SampledexError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, SampleRecord>>> {
        self.records
            .write()
            .map_err(|e| SampledexError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn list_identities(&self) -> Result<HashSet<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    async fn upsert(&self, record: &SampleRecord) -> Result<()> {
        self.write()?
            .insert(record.identity.to_string(), record.clone());
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let records = self.read()?;

        let mut results: Vec<Neighbor> = records
            .values()
            .filter(|record| {
                let matches = record.vector.len() == vector.len();
                if !matches {
                    warn!(
                        "Skipping {}: stored vector has {} dimensions, query has {}",
                        record.identity,
                        record.vector.len(),
                        vector.len()
                    );
                }
                matches
            })
            .map(|record| Neighbor {
                identity: record.identity.to_string(),
                filename: record.filename.clone(),
                distance: cosine_distance(vector, &record.vector),
            })
            .collect();

        results.sort_by(rank_order);
        results.truncate(k);

        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    async fn list(&self) -> Result<Vec<IndexedSample>> {
        let mut samples: Vec<IndexedSample> =
            self.read()?.values().map(SampleRecord::summary).collect();
        samples.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(samples)
    }

    async fn remove(&self, identity: &str) -> Result<bool> {
        Ok(self.write()?.remove(identity).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SampleId;
    use std::path::PathBuf;

    fn record(path: &str, vector: Vec<f32>) -> SampleRecord {
        let path = PathBuf::from(path);
        SampleRecord::new(SampleId::from_path(&path).unwrap(), path, vector, Some(1.0))
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        store.upsert(&record("/s/kick.wav", vec![1.0, 0.0, 0.0])).await.unwrap();
        store.upsert(&record("/s/snare.wav", vec![0.0, 1.0, 0.0])).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 2);

        let results = store.query(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].identity, "/s/kick.wav");
        assert!(results[0].distance < results[1].distance);

        let ids = store.list_identities().await.unwrap();
        assert!(ids.contains("/s/snare.wav"));
    }

    #[tokio::test]
    async fn test_query_skips_mismatched_dimensions() {
        let store = MemoryVectorStore::new();

        store.upsert(&record("/s/kick.wav", vec![1.0, 0.0, 0.0])).await.unwrap();
        store.upsert(&record("/s/old.wav", vec![1.0, 0.0])).await.unwrap();

        let results = store.query(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].identity, "/s/kick.wav");
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_identity() {
        let store = MemoryVectorStore::new();

        store.upsert(&record("/s/kick.wav", vec![1.0, 0.0])).await.unwrap();
        store.upsert(&record("/s/kick.wav", vec![0.0, 1.0])).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let results = store.query(&[0.0, 1.0], 1).await.unwrap();
        assert!(results[0].distance.abs() < 0.001);

        assert!(store.remove("/s/kick.wav").await.unwrap());
        assert!(!store.remove("/s/kick.wav").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
