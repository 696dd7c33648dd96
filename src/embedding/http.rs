//! HTTP client for an external embedding inference service.
//!
//! The service exposes three JSON endpoints relative to its base URL:
//! `GET health`, `POST embed/text` and `POST embed/audio`.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{Result, SampledexError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

#[derive(Serialize)]
struct TextRequest<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct AudioRequest<'a> {
    samples: &'a [f32],
    sample_rate: u32,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
    #[serde(default)]
    dimensions: Option<usize>,
    #[serde(default)]
    sample_rate: Option<u32>,
}

/// Embedder backed by a remote inference service.
pub struct HttpEmbedder {
    client: reqwest::Client,
    base: Url,
    dimensions: usize,
    sample_rate: u32,
}

impl HttpEmbedder {
    /// Create a client from embedding settings.
    pub fn with_config(settings: &EmbeddingSettings) -> Result<Self> {
        let mut endpoint = settings.endpoint.trim().to_string();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let base = Url::parse(&endpoint).map_err(|e| {
            SampledexError::Config(format!(
                "Invalid embedding endpoint '{}': {}",
                settings.endpoint, e
            ))
        })?;

        if settings.sample_rate == 0 {
            return Err(SampledexError::Config(
                "embedding.sample_rate must be greater than zero".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| SampledexError::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base,
            dimensions: settings.dimensions as usize,
            sample_rate: settings.sample_rate,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| SampledexError::Config(format!("Invalid embedding endpoint: {}", e)))
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(self.url(path)?)
            .json(body)
            .send()
            .await
            .map_err(|e| SampledexError::Embedding(format!("Request to {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SampledexError::Embedding(format!(
                "{} returned {}: {}",
                path,
                status,
                detail.trim()
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| SampledexError::Embedding(format!("Malformed response from {}: {}", path, e)))?;

        self.check_dimensions(parsed.embedding)
    }

    fn check_dimensions(&self, embedding: Vec<f32>) -> Result<Vec<f32>> {
        if embedding.is_empty() {
            return Err(SampledexError::Embedding("Empty embedding response".to_string()));
        }
        if self.dimensions != 0 && embedding.len() != self.dimensions {
            return Err(SampledexError::Embedding(format!(
                "Expected {} dimensions, service returned {}",
                self.dimensions,
                embedding.len()
            )));
        }
        Ok(embedding)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    #[instrument(skip(self))]
    async fn ready(&self) -> Result<()> {
        let response = self
            .client
            .get(self.url("health")?)
            .send()
            .await
            .map_err(|e| SampledexError::Embedding(format!("Embedding service unreachable at {}: {}", self.base, e)))?;

        if !response.status().is_success() {
            return Err(SampledexError::Embedding(format!(
                "Embedding service at {} is not ready ({})",
                self.base,
                response.status()
            )));
        }

        let health: HealthResponse = response
            .json()
            .await
            .map_err(|e| SampledexError::Embedding(format!("Malformed health response: {}", e)))?;

        if health.status != "ok" {
            return Err(SampledexError::Embedding(format!(
                "Embedding service reports status '{}'",
                health.status
            )));
        }
        if let Some(dims) = health.dimensions {
            if self.dimensions != 0 && dims != self.dimensions {
                return Err(SampledexError::Embedding(format!(
                    "Service model produces {} dimensions, configuration expects {}",
                    dims, self.dimensions
                )));
            }
        }
        if let Some(rate) = health.sample_rate {
            if rate != self.sample_rate {
                return Err(SampledexError::Embedding(format!(
                    "Service expects {} Hz audio, configuration uses {} Hz",
                    rate, self.sample_rate
                )));
            }
        }

        info!("Embedding service ready at {}", self.base);
        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Embedding query text");
        self.post("embed/text", &TextRequest { text }).await
    }

    #[instrument(skip(self, samples), fields(samples = samples.len()))]
    async fn embed_audio(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>> {
        if samples.is_empty() {
            return Err(SampledexError::Embedding("No audio samples to embed".to_string()));
        }
        self.post("embed/audio", &AudioRequest { samples, sample_rate }).await
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
