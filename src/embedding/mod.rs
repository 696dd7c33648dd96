//! Embedding generation for audio indexing and text queries.
//!
//! Audio and text embeddings come from one joint model, so a text query
//! vector can be compared directly against stored audio vectors.

mod http;

pub use http::HttpEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for joint audio/text embedding providers.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Check that the backing model is loaded and reachable.
    async fn ready(&self) -> Result<()>;

    /// Generate the query embedding for a text.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate the content embedding for mono PCM samples.
    async fn embed_audio(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>>;

    /// Sample rate audio must be resampled to before `embed_audio`.
    fn sample_rate(&self) -> u32;

    /// Get the embedding dimensions (0 when not fixed by configuration).
    fn dimensions(&self) -> usize;
}
