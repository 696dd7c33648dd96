//! Audio decoding to mono PCM at the embedding model's sample rate.

use crate::error::{Result, SampledexError};
use std::path::Path;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Decoded audio as mono PCM samples at a specific sample rate.
#[derive(Debug)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub duration_secs: f64,
}

fn decode_error(path: &Path, what: &str, e: impl std::fmt::Display) -> SampledexError {
    SampledexError::Decode(format!("{}: {}: {}", path.display(), what, e))
}

/// Decode an audio file to mono PCM samples.
///
/// Stops after `max_duration` of audio, averages channels to mono and
/// resamples to `target_sample_rate`.
pub fn decode_file(path: &Path, target_sample_rate: u32, max_duration: Duration) -> Result<DecodedAudio> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_error(path, "unsupported format", e))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| decode_error(path, "no audio track", "default track missing"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error(path, "no decoder", e))?;

    let mut source_rate = codec_params.sample_rate.unwrap_or(0);
    let mut channels = codec_params.channels.map_or(0, |c| c.count());
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut mono = Vec::new();
    let mut max_frames = frame_limit(source_rate, max_duration);

    loop {
        if max_frames.is_some_and(|limit| mono.len() >= limit) {
            break;
        }

        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_error(path, "failed to read packet", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let audio_buf = match decoder.decode(&packet) {
            Ok(buf) => buf,
            Err(SymphoniaError::DecodeError(e)) => {
                debug!("Skipping corrupt packet in {}: {}", path.display(), e);
                continue;
            }
            Err(e) => return Err(decode_error(path, "failed to decode packet", e)),
        };

        let spec = *audio_buf.spec();
        if source_rate == 0 {
            source_rate = spec.rate;
            max_frames = frame_limit(source_rate, max_duration);
        }
        if channels == 0 {
            channels = spec.channels.count();
        }

        let frames = audio_buf.capacity() as u64;
        let needs_buffer = sample_buf
            .as_ref()
            .map_or(true, |buf| (buf.capacity() as u64) < frames * spec.channels.count() as u64);
        if needs_buffer {
            sample_buf = Some(SampleBuffer::<f32>::new(frames, spec));
        }

        if let Some(buf) = sample_buf.as_mut() {
            buf.copy_interleaved_ref(audio_buf);
            append_mono(&mut mono, buf.samples(), spec.channels.count().max(1));
        }
    }

    if source_rate == 0 {
        return Err(decode_error(path, "unknown sample rate", "no decodable packets"));
    }
    if let Some(limit) = max_frames {
        mono.truncate(limit);
    }
    if mono.is_empty() {
        return Err(decode_error(path, "no audio", "stream decoded to zero samples"));
    }

    let samples = resample_linear(&mono, source_rate, target_sample_rate);

    #[allow(clippy::cast_precision_loss)]
    let duration_secs = samples.len() as f64 / f64::from(target_sample_rate);

    Ok(DecodedAudio {
        samples,
        sample_rate: target_sample_rate,
        duration_secs,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn frame_limit(sample_rate: u32, max_duration: Duration) -> Option<usize> {
    if sample_rate == 0 {
        return None;
    }
    Some((max_duration.as_secs_f64() * f64::from(sample_rate)).ceil() as usize)
}

/// Average interleaved channels into mono frames.
#[allow(clippy::cast_precision_loss)]
fn append_mono(out: &mut Vec<f32>, interleaved: &[f32], channels: usize) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
    } else {
        out.extend(
            interleaved
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }
}

/// Linear-interpolation resampling.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || to_rate == 0 {
        return samples.to_vec();
    }

    let ratio = f64::from(from_rate) / f64::from(to_rate);
    let output_len = (samples.len() as f64 / ratio) as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let pos = i as f64 * ratio;
        let idx = pos as usize;
        if idx + 1 < samples.len() {
            let frac = (pos - idx as f64) as f32;
            output.push(samples[idx].mul_add(1.0 - frac, samples[idx + 1] * frac));
        } else if idx < samples.len() {
            output.push(samples[idx]);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{write_aiff, write_wav};

    #[test]
    fn test_resample_identity() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(resample_linear(&samples, 44_100, 44_100), samples);
    }

    #[test]
    fn test_resample_downsample() {
        let samples = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(resample_linear(&samples, 44_100, 22_050).len(), 2);
    }

    #[test]
    fn test_resample_upsample_interpolates() {
        let resampled = resample_linear(&[0.0, 1.0], 22_050, 44_100);
        assert_eq!(resampled.len(), 4);
        assert!((resampled[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_append_mono_averages_channels() {
        let mut out = Vec::new();
        append_mono(&mut out, &[1.0, 0.0, 0.5, 0.5], 2);
        assert_eq!(out, vec![0.5, 0.5]);
    }

    #[test]
    fn test_decode_wav_resamples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kick.wav");
        write_wav(&path, 0.5, 8_000, 220.0);

        let audio = decode_file(&path, 16_000, Duration::from_secs(10)).unwrap();
        assert_eq!(audio.sample_rate, 16_000);
        assert!((audio.duration_secs - 0.5).abs() < 0.01);
        assert!(audio.samples.iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn test_decode_is_bounded_by_max_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.wav");
        write_wav(&path, 3.0, 8_000, 220.0);

        let audio = decode_file(&path, 8_000, Duration::from_secs(1)).unwrap();
        assert_eq!(audio.samples.len(), 8_000);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        std::fs::write(&path, b"not audio at all").unwrap();

        let err = decode_file(&path, 16_000, Duration::from_secs(10)).unwrap_err();
        assert!(matches!(err, SampledexError::Decode(_)));
    }

    #[test]
    fn test_decode_aiff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hit.aiff");
        write_aiff(&path, 1.0, 8_000, 220.0);

        let audio = decode_file(&path, 8_000, Duration::from_secs(10)).unwrap();
        assert_eq!(audio.samples.len(), 8_000);
        assert!(audio.samples.iter().any(|s| s.abs() > 0.1));
    }
}
