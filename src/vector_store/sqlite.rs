//! SQLite-based vector store implementation.
//!
//! A store is a directory holding one SQLite file per collection
//! (`<dir>/<collection>.db`). Distances are computed in Rust by a linear
//! scan, which is plenty for sample libraries of a few hundred thousand
//! one-shots.

use super::{cosine_distance, rank_order, IndexedSample, Neighbor, SampleRecord, VectorStore};
use crate::error::{Result, SampledexError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS samples (
        identity TEXT PRIMARY KEY,
        filename TEXT,
        source_path TEXT NOT NULL,
        duration_seconds REAL,
        embedding BLOB NOT NULL,
        dimensions INTEGER NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_samples_indexed_at ON samples(indexed_at);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteVectorStore {
    /// Open an existing store.
    ///
    /// Fails with `StoreUnavailable` when the directory or the collection
    /// file does not exist. Nothing is created.
    #[instrument(skip_all, fields(dir = %dir.display(), collection = %collection))]
    pub fn open(dir: &Path, collection: &str) -> Result<Self> {
        let db_path = collection_path(dir, collection)?;

        if !dir.is_dir() {
            return Err(SampledexError::StoreUnavailable {
                path: dir.to_path_buf(),
                reason: "store directory not found".to_string(),
            });
        }
        if !db_path.is_file() {
            return Err(SampledexError::StoreUnavailable {
                path: db_path,
                reason: format!("collection '{}' not found", collection),
            });
        }

        let conn = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| SampledexError::StoreUnavailable {
            path: db_path.clone(),
            reason: e.to_string(),
        })?;

        Self::init(conn, Some(db_path))
    }

    /// Open a store, creating the directory and collection if needed.
    #[instrument(skip_all, fields(dir = %dir.display(), collection = %collection))]
    pub fn open_or_create(dir: &Path, collection: &str) -> Result<Self> {
        let db_path = collection_path(dir, collection)?;

        std::fs::create_dir_all(dir).map_err(|e| SampledexError::StoreUnavailable {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let conn = Connection::open(&db_path).map_err(|e| SampledexError::StoreUnavailable {
            path: db_path.clone(),
            reason: e.to_string(),
        })?;

        Self::init(conn, Some(db_path))
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        if path.is_some() {
            // WAL lets searches read while an indexing run writes.
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }
        conn.execute_batch(SCHEMA)?;

        if let Some(p) = &path {
            info!("Opened SQLite vector store at {:?}", p);
        }

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Path of the collection file, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SampledexError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }
}

/// Location of a collection file inside a store directory.
fn collection_path(dir: &Path, collection: &str) -> Result<PathBuf> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(SampledexError::Config(format!(
            "Invalid collection name '{}': use letters, digits, '_' or '-'",
            collection
        )));
    }
    Ok(dir.join(format!("{}.db", collection)))
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn list_identities(&self) -> Result<HashSet<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT identity FROM samples")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    #[instrument(skip(self, record), fields(identity = %record.identity))]
    async fn upsert(&self, record: &SampleRecord) -> Result<()> {
        let conn = self.conn()?;
        let source_path = record.source_path.to_string_lossy().into_owned();

        conn.execute(
            r#"
            INSERT OR REPLACE INTO samples
            (identity, filename, source_path, duration_seconds, embedding, dimensions, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.identity.as_str(),
                record.filename,
                source_path,
                record.duration_seconds,
                Self::embedding_to_bytes(&record.vector),
                record.vector.len() as i64,
                record.indexed_at.to_rfc3339(),
            ],
        )?;

        debug!("Upserted sample");
        Ok(())
    }

    #[instrument(skip(self, vector))]
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT identity, filename, embedding FROM samples")?;
        let rows = stmt.query_map([], |row| {
            let embedding: Vec<u8> = row.get(2)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                embedding,
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            match row {
                Ok((identity, filename, bytes)) => {
                    let embedding = Self::bytes_to_embedding(&bytes);
                    if embedding.len() != vector.len() {
                        warn!(
                            "Skipping {}: stored vector has {} dimensions, query has {}",
                            identity,
                            embedding.len(),
                            vector.len()
                        );
                        continue;
                    }
                    results.push(Neighbor {
                        distance: cosine_distance(vector, &embedding),
                        identity,
                        filename,
                    });
                }
                Err(e) => warn!("Skipping unreadable row: {}", e),
            }
        }

        results.sort_by(rank_order);
        results.truncate(k);

        debug!("Found {} neighbors", results.len());
        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM samples", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<IndexedSample>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT identity, filename, source_path, duration_seconds, indexed_at
            FROM samples
            ORDER BY identity
            "#,
        )?;

        let samples = stmt.query_map([], |row| {
            let indexed_at: String = row.get(4)?;
            Ok(IndexedSample {
                identity: row.get(0)?,
                filename: row.get(1)?,
                source_path: row.get(2)?,
                duration_seconds: row.get(3)?,
                indexed_at: parse_timestamp(&indexed_at),
            })
        })?;

        Ok(samples.filter_map(|s| s.ok()).collect())
    }

    #[instrument(skip(self))]
    async fn remove(&self, identity: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM samples WHERE identity = ?1", params![identity])?;
        Ok(deleted > 0)
    }
}
