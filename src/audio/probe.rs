//! Cheap duration probing from container metadata.

use crate::error::{Result, SampledexError};
use lofty::file::AudioFile;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Estimates playback duration without decoding audio.
pub trait DurationProbe: Send + Sync {
    /// Duration of the file, or `None` when it cannot be determined.
    fn probe(&self, path: &Path) -> Option<Duration>;
}

/// Reads duration from container headers and tags via `lofty`.
///
/// Any parse failure, unsupported container, or zero-length stream yields
/// `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataProbe;

impl MetadataProbe {
    pub fn new() -> Self {
        Self
    }

    fn read_duration(path: &Path) -> Result<Duration> {
        let tagged_file = lofty::read_from_path(path)
            .map_err(|e| SampledexError::Probe(format!("{}: {}", path.display(), e)))?;
        Ok(tagged_file.properties().duration())
    }
}

impl DurationProbe for MetadataProbe {
    fn probe(&self, path: &Path) -> Option<Duration> {
        match Self::read_duration(path) {
            Ok(duration) if !duration.is_zero() => Some(duration),
            Ok(_) => {
                debug!("No duration in metadata for {}", path.display());
                None
            }
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }
}
