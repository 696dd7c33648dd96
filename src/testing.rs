//! Test fixtures shared across module tests.

use crate::embedding::Embedder;
use crate::error::{Result, SampledexError};
use async_trait::async_trait;
use std::f32::consts::PI;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn sine_frames(seconds: f64, sample_rate: u32, frequency: f32) -> Vec<i16> {
    let frames = (seconds * f64::from(sample_rate)).round() as u32;
    (0..frames)
        .map(|n| {
            let t = n as f32 / sample_rate as f32;
            let value = (2.0 * PI * frequency * t).sin() * 0.5;
            (value * f32::from(i16::MAX)) as i16
        })
        .collect()
}

fn write_fixture(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}

/// Write a mono 16-bit PCM WAV file. A frequency of 0 writes silence.
#[allow(clippy::cast_possible_truncation)]
pub fn write_wav(path: &Path, seconds: f64, sample_rate: u32, frequency: f32) {
    let frames = sine_frames(seconds, sample_rate, frequency);
    let data_len = frames.len() as u32 * 2;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for sample in frames {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }

    write_fixture(path, &bytes);
}

/// Write a mono 16-bit big-endian PCM AIFF file.
#[allow(clippy::cast_possible_truncation)]
pub fn write_aiff(path: &Path, seconds: f64, sample_rate: u32, frequency: f32) {
    let frames = sine_frames(seconds, sample_rate, frequency);
    let data_len = frames.len() as u32 * 2;
    let comm_len = 18u32;
    let ssnd_len = 8 + data_len;

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"FORM");
    bytes.extend_from_slice(&(4 + 8 + comm_len + 8 + ssnd_len).to_be_bytes());
    bytes.extend_from_slice(b"AIFF");

    bytes.extend_from_slice(b"COMM");
    bytes.extend_from_slice(&comm_len.to_be_bytes());
    bytes.extend_from_slice(&1u16.to_be_bytes()); // mono
    bytes.extend_from_slice(&(frames.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&16u16.to_be_bytes());
    bytes.extend_from_slice(&extended_be(sample_rate));

    bytes.extend_from_slice(b"SSND");
    bytes.extend_from_slice(&ssnd_len.to_be_bytes());
    bytes.extend_from_slice(&0u32.to_be_bytes()); // offset
    bytes.extend_from_slice(&0u32.to_be_bytes()); // block size
    for sample in frames {
        bytes.extend_from_slice(&sample.to_be_bytes());
    }

    write_fixture(path, &bytes);
}

/// 80-bit IEEE extended encoding of a positive integer, as AIFF stores rates.
fn extended_be(value: u32) -> [u8; 10] {
    let shift = 31 - value.leading_zeros();
    let exponent = 16_383 + shift as u16;
    let mantissa = u64::from(value) << (63 - shift);

    let mut out = [0u8; 10];
    out[..2].copy_from_slice(&exponent.to_be_bytes());
    out[2..].copy_from_slice(&mantissa.to_be_bytes());
    out
}

/// Deterministic embedder for tests.
///
/// Audio vectors summarize loudness and zero crossings; silent input is
/// rejected so fixtures can force per-file failures.
pub struct FakeEmbedder {
    ready: bool,
    dimensions: usize,
    text_calls: AtomicUsize,
    audio_calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self {
            ready: true,
            dimensions: 4,
            text_calls: AtomicUsize::new(0),
            audio_calls: AtomicUsize::new(0),
        }
    }

    /// An embedder whose model never loads.
    pub fn unavailable() -> Self {
        Self {
            ready: false,
            ..Self::new()
        }
    }

    /// Report a dimension count other than the four actually produced.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn audio_calls(&self) -> usize {
        self.audio_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(SampledexError::Embedding("model failed to load".to_string()))
        }
    }

    #[allow(clippy::cast_precision_loss)]
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        let bytes = text.as_bytes();
        let sum: u32 = bytes.iter().map(|b| u32::from(*b)).sum();
        Ok(vec![
            1.0,
            bytes.len() as f32 / 32.0,
            (sum % 97) as f32 / 97.0,
            0.5,
        ])
    }

    #[allow(clippy::cast_precision_loss)]
    async fn embed_audio(&self, samples: &[f32], _sample_rate: u32) -> Result<Vec<f32>> {
        self.audio_calls.fetch_add(1, Ordering::SeqCst);
        let peak = samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        if peak == 0.0 {
            return Err(SampledexError::Embedding("silent input".to_string()));
        }
        let crossings = samples
            .windows(2)
            .filter(|w| (w[0] < 0.0) != (w[1] < 0.0))
            .count();
        Ok(vec![
            peak,
            crossings as f32 / samples.len() as f32,
            samples.len() as f32 / 16_000.0,
            0.5,
        ])
    }

    fn sample_rate(&self) -> u32 {
        16_000
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
