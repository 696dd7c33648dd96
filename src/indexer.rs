//! Indexing orchestrator.
//!
//! Coordinates a run from directory scan to stored embeddings: snapshot
//! the known identities, build the work list, then decode, embed and
//! upsert each file. A file that fails is logged and skipped; only a
//! provider that cannot start aborts the run.

use crate::audio::decode_file;
use crate::config::Settings;
use crate::embedding::Embedder;
use crate::error::{Result, SampledexError};
use crate::scanner::{Scanner, WorkItem};
use crate::vector_store::{SampleRecord, VectorStore};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Progress of a running index job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexProgress {
    /// Items finished so far, successful or not.
    pub completed: usize,
    /// Size of the work list.
    pub total: usize,
}

impl IndexProgress {
    /// Completion rounded to the nearest whole percent.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let rounded = (200 * self.completed + self.total) / (2 * self.total);
        u8::try_from(rounded.min(100)).unwrap_or(100)
    }
}

/// Outcome of an index run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    /// Files embedded and stored.
    pub processed: usize,
    /// Files that failed to decode, embed or store.
    pub failed: usize,
    /// Size of the work list.
    pub total: usize,
    /// Whether the run stopped early on request.
    pub cancelled: bool,
}

/// Cooperative stop signal, checked before each file starts.
///
/// A request applies to the run in progress; each new run clears it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

enum ItemOutcome {
    Stored,
    Failed,
    NotStarted,
}

/// Drives scanning, embedding and storage of a sample corpus.
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    scanner: Scanner,
    max_duration: Duration,
    concurrency: usize,
    cancel: CancelToken,
}

impl Indexer {
    /// Create an indexer with default scanning and a 10 second limit.
    pub fn new(embedder: Arc<dyn Embedder>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            vector_store,
            scanner: Scanner::new(),
            max_duration: Duration::from_secs(10),
            concurrency: 1,
            cancel: CancelToken::new(),
        }
    }

    /// Create an indexer configured from settings.
    pub fn from_settings(
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let scanner = Scanner::new().with_extensions(&settings.index.extensions);
        Ok(Self::new(embedder, vector_store)
            .with_scanner(scanner)
            .with_max_duration(settings.index.max_duration()?)
            .with_concurrency(settings.index.concurrency))
    }

    /// Replace the scanner.
    pub fn with_scanner(mut self, scanner: Scanner) -> Self {
        self.scanner = scanner;
        self
    }

    /// Set the default duration limit used by `run_indexing`.
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    /// Set how many files are embedded at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Share an externally owned cancel token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the current run between files.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Index a folder with the configured duration limit.
    ///
    /// Returns the number of files stored.
    pub async fn run_indexing<F>(&self, folder: &Path, on_progress: F) -> Result<usize>
    where
        F: FnMut(IndexProgress),
    {
        let summary = self.index(folder, self.max_duration, on_progress).await?;
        Ok(summary.processed)
    }

    /// Index every new file under `root` no longer than `max_duration`.
    ///
    /// `on_progress` is called once per finished file with non-decreasing
    /// values, ending at 100% unless the run is cancelled. An empty work
    /// list produces no callbacks.
    #[instrument(skip(self, on_progress), fields(root = %root.display()))]
    pub async fn index<F>(
        &self,
        root: &Path,
        max_duration: Duration,
        mut on_progress: F,
    ) -> Result<IndexSummary>
    where
        F: FnMut(IndexProgress),
    {
        self.cancel.reset();
        self.embedder.ready().await?;

        let existing = self.vector_store.list_identities().await?;
        info!("Scanning {} ({} samples already indexed)", root.display(), existing.len());

        let work: Vec<WorkItem> = self.scanner.scan(root, &existing, max_duration)?.collect();
        let total = work.len();
        let mut summary = IndexSummary {
            total,
            ..Default::default()
        };

        if total == 0 {
            info!("Nothing new to index");
            return Ok(summary);
        }

        info!("Found {} files. Indexing...", total);

        let mut outcomes = stream::iter(work)
            .map(|item| async move {
                if self.cancel.is_cancelled() {
                    return ItemOutcome::NotStarted;
                }
                match self.index_item(&item, max_duration).await {
                    Ok(()) => ItemOutcome::Stored,
                    Err(e) => {
                        warn!("Failed to index {}: {}", item.path.display(), e);
                        ItemOutcome::Failed
                    }
                }
            })
            .buffer_unordered(self.concurrency);

        let mut completed = 0;
        while let Some(outcome) = outcomes.next().await {
            match outcome {
                ItemOutcome::Stored => summary.processed += 1,
                ItemOutcome::Failed => summary.failed += 1,
                ItemOutcome::NotStarted => {
                    summary.cancelled = true;
                    continue;
                }
            }
            completed += 1;
            on_progress(IndexProgress { completed, total });
        }

        if summary.cancelled {
            info!(
                "Indexing cancelled after {} of {} files ({} stored)",
                completed, total, summary.processed
            );
        } else {
            info!(
                "Indexed {} of {} files ({} failed)",
                summary.processed, total, summary.failed
            );
        }

        Ok(summary)
    }

    async fn index_item(&self, item: &WorkItem, max_duration: Duration) -> Result<()> {
        let path = item.path.clone();
        let sample_rate = self.embedder.sample_rate();

        let audio = tokio::task::spawn_blocking(move || decode_file(&path, sample_rate, max_duration))
            .await
            .map_err(|e| SampledexError::Decode(format!("decoder task failed: {}", e)))??;

        debug!(
            "Decoded {} ({:.2}s at {} Hz)",
            item.path.display(),
            audio.duration_secs,
            audio.sample_rate
        );

        let vector = self
            .embedder
            .embed_audio(&audio.samples, audio.sample_rate)
            .await?;

        let expected = self.embedder.dimensions();
        if expected != 0 && vector.len() != expected {
            return Err(SampledexError::Embedding(format!(
                "Expected {} dimensions, got {}",
                expected,
                vector.len()
            )));
        }

        let record = SampleRecord::new(
            item.identity.clone(),
            item.path.clone(),
            vector,
            Some(item.probed_duration.as_secs_f64()),
        );
        self.vector_store.upsert(&record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SampleId;
    use crate::testing::{write_wav, FakeEmbedder};
    use crate::vector_store::MemoryVectorStore;
    use tempfile::TempDir;

    fn indexer(embedder: Arc<FakeEmbedder>, store: Arc<MemoryVectorStore>) -> Indexer {
        Indexer::new(embedder, store)
    }

    #[test]
    fn test_progress_percent_rounding() {
        let p = |completed, total| IndexProgress { completed, total }.percent();
        assert_eq!(p(1, 3), 33);
        assert_eq!(p(2, 3), 67);
        assert_eq!(p(3, 3), 100);
        assert_eq!(p(1, 200), 1);
        assert_eq!(p(0, 0), 100);
    }

    #[tokio::test]
    async fn test_short_samples_indexed_long_ones_skipped() {
        let dir = TempDir::new().unwrap();
        let kick = dir.path().join("kick.wav");
        write_wav(&kick, 0.8, 8_000, 440.0);
        write_wav(&dir.path().join("pad.wav"), 25.0, 8_000, 110.0);

        let store = Arc::new(MemoryVectorStore::new());
        let embedder = Arc::new(FakeEmbedder::new());
        let indexer = indexer(embedder.clone(), store.clone());

        let mut progress = Vec::new();
        let summary = indexer
            .index(dir.path(), Duration::from_secs(10), |p| progress.push(p.percent()))
            .await
            .unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.total, 1);
        assert_eq!(progress, vec![100]);
        assert_eq!(embedder.audio_calls(), 1);

        let ids = store.list_identities().await.unwrap();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains(SampleId::from_path(&kick).unwrap().as_str()));
    }

    #[tokio::test]
    async fn test_reindexing_is_idempotent() {
        let dir = TempDir::new().unwrap();
        for name in ["a.wav", "b.wav", "c.wav"] {
            write_wav(&dir.path().join(name), 0.3, 8_000, 330.0);
        }

        let store = Arc::new(MemoryVectorStore::new());
        let embedder = Arc::new(FakeEmbedder::new());
        let indexer = indexer(embedder.clone(), store.clone());

        let first = indexer.run_indexing(dir.path(), |_| {}).await.unwrap();
        assert_eq!(first, 3);

        let mut calls = 0;
        let second = indexer.run_indexing(dir.path(), |_| calls += 1).await.unwrap();
        assert_eq!(second, 0);
        assert_eq!(calls, 0);
        assert_eq!(store.count().await.unwrap(), 3);
        assert_eq!(embedder.audio_calls(), 3);
    }

    #[tokio::test]
    async fn test_single_failure_does_not_abort_run() {
        let dir = TempDir::new().unwrap();
        for (i, name) in ["s1.wav", "s2.wav", "s3.wav", "s4.wav", "s5.wav"].iter().enumerate() {
            // s3 is silent, which the fake embedder rejects
            let frequency = if i == 2 { 0.0 } else { 220.0 };
            write_wav(&dir.path().join(name), 0.4, 8_000, frequency);
        }

        let store = Arc::new(MemoryVectorStore::new());
        let indexer = indexer(Arc::new(FakeEmbedder::new()), store.clone());

        let mut progress = Vec::new();
        let summary = indexer
            .index(dir.path(), Duration::from_secs(10), |p| progress.push(p.percent()))
            .await
            .unwrap();

        assert_eq!(summary.processed, 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(progress, vec![20, 40, 60, 80, 100]);
        assert_eq!(store.count().await.unwrap(), 4);

        let failed = SampleId::from_path(&dir.path().join("s3.wav")).unwrap();
        assert!(!store.list_identities().await.unwrap().contains(failed.as_str()));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_with_concurrency() {
        let dir = TempDir::new().unwrap();
        for i in 0..7 {
            write_wav(&dir.path().join(format!("hit{}.wav", i)), 0.2, 8_000, 440.0);
        }

        let store = Arc::new(MemoryVectorStore::new());
        let indexer = indexer(Arc::new(FakeEmbedder::new()), store.clone()).with_concurrency(3);

        let mut progress = Vec::new();
        let summary = indexer
            .index(dir.path(), Duration::from_secs(10), |p| progress.push(p.percent()))
            .await
            .unwrap();

        assert_eq!(summary.processed, 7);
        assert_eq!(progress.len(), 7);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(progress.last(), Some(&100));
    }

    #[tokio::test]
    async fn test_unavailable_model_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_wav(&dir.path().join("kick.wav"), 0.5, 8_000, 440.0);

        let store = Arc::new(MemoryVectorStore::new());
        let indexer = indexer(Arc::new(FakeEmbedder::unavailable()), store.clone());

        let err = indexer
            .index(dir.path(), Duration::from_secs(10), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, SampledexError::Embedding(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_folder_is_input_error() {
        let dir = TempDir::new().unwrap();
        let indexer = indexer(
            Arc::new(FakeEmbedder::new()),
            Arc::new(MemoryVectorStore::new()),
        );

        let err = indexer
            .index(&dir.path().join("absent"), Duration::from_secs(10), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, SampledexError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_cancelled_run_keeps_partial_progress() {
        let dir = TempDir::new().unwrap();
        for name in ["a.wav", "b.wav", "c.wav", "d.wav"] {
            write_wav(&dir.path().join(name), 0.2, 8_000, 440.0);
        }

        let store = Arc::new(MemoryVectorStore::new());
        let indexer = indexer(Arc::new(FakeEmbedder::new()), store.clone());
        let token = indexer.cancel_token();

        let mut progress = Vec::new();
        let summary = indexer
            .index(dir.path(), Duration::from_secs(10), |p| {
                progress.push(p.percent());
                if p.completed == 2 {
                    token.cancel();
                }
            })
            .await
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.processed, 2);
        assert_eq!(progress, vec![25, 50]);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_run_after_cancelled_run_finishes() {
        let dir = TempDir::new().unwrap();
        for name in ["a.wav", "b.wav", "c.wav"] {
            write_wav(&dir.path().join(name), 0.2, 8_000, 440.0);
        }

        let store = Arc::new(MemoryVectorStore::new());
        let indexer = indexer(Arc::new(FakeEmbedder::new()), store.clone());
        let token = indexer.cancel_token();

        let first = indexer
            .index(dir.path(), Duration::from_secs(10), |_| token.cancel())
            .await
            .unwrap();
        assert!(first.cancelled);
        assert_eq!(first.processed, 1);

        let mut progress = Vec::new();
        let second = indexer
            .index(dir.path(), Duration::from_secs(10), |p| progress.push(p.percent()))
            .await
            .unwrap();
        assert!(!second.cancelled);
        assert_eq!(second.processed, 2);
        assert_eq!(second.total, 2);
        assert_eq!(progress, vec![50, 100]);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_vectors_of_wrong_length_are_rejected() {
        let dir = TempDir::new().unwrap();
        write_wav(&dir.path().join("kick.wav"), 0.2, 8_000, 440.0);

        let store = Arc::new(MemoryVectorStore::new());
        let embedder = Arc::new(FakeEmbedder::new().with_dimensions(8));
        let indexer = indexer(embedder, store.clone());

        let summary = indexer
            .index(dir.path(), Duration::from_secs(10), |_| {})
            .await
            .unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed, 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
