//! Corpus scanning: discover audio files that still need embedding.

use crate::audio::{DurationProbe, MetadataProbe};
use crate::error::{Result, SampledexError};
use crate::identity::{normalize_path, SampleId};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Audio container extensions admitted by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg", "aiff", "aif", "m4a"];

/// A file that passed every admission filter and awaits embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub path: PathBuf,
    pub identity: SampleId,
    pub probed_duration: Duration,
}

/// Walks a directory tree and filters candidates.
pub struct Scanner {
    probe: Arc<dyn DurationProbe>,
    extensions: Vec<String>,
}

impl Scanner {
    /// Create a scanner with the metadata probe and default extensions.
    pub fn new() -> Self {
        Self {
            probe: Arc::new(MetadataProbe::new()),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Replace the duration probe.
    pub fn with_probe(mut self, probe: Arc<dyn DurationProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Replace the extension allow-list.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    fn is_audio_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }

    /// Lazily yield the files under `root` that should be embedded.
    ///
    /// Files whose identity is in `existing` are skipped, as are files
    /// whose duration is unknown or longer than `max_duration`. Traversal
    /// is sorted by file name so the order is stable for a given tree.
    pub fn scan<'a>(
        &'a self,
        root: &Path,
        existing: &'a HashSet<String>,
        max_duration: Duration,
    ) -> Result<impl Iterator<Item = WorkItem> + 'a> {
        let root = normalize_path(root)?;
        if !root.exists() {
            return Err(SampledexError::InvalidInput(format!(
                "Folder not found: {}",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(SampledexError::InvalidInput(format!(
                "Not a directory: {}",
                root.display()
            )));
        }

        let entries = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            });

        Ok(entries
            .filter(|entry| entry.file_type().is_file())
            .filter(move |entry| self.is_audio_file(entry.path()))
            .filter_map(move |entry| self.admit(entry, existing, max_duration)))
    }

    fn admit(
        &self,
        entry: DirEntry,
        existing: &HashSet<String>,
        max_duration: Duration,
    ) -> Option<WorkItem> {
        let path = entry.into_path();
        let identity = match SampleId::from_path(&path) {
            Ok(id) => id,
            Err(e) => {
                warn!("Cannot derive identity for {}: {}", path.display(), e);
                return None;
            }
        };

        if existing.contains(identity.as_str()) {
            debug!("Already indexed: {}", identity);
            return None;
        }

        let Some(duration) = self.probe.probe(&path) else {
            debug!("Unknown duration, skipping {}", path.display());
            return None;
        };

        if duration > max_duration {
            debug!(
                "Too long ({:.2}s > {:.2}s), skipping {}",
                duration.as_secs_f64(),
                max_duration.as_secs_f64(),
                path.display()
            );
            return None;
        }

        Some(WorkItem {
            path,
            identity,
            probed_duration: duration,
        })
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}
