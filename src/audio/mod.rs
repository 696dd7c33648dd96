//! Audio file access: metadata probing and PCM decoding.

pub mod decoder;
pub mod probe;

pub use decoder::{decode_file, DecodedAudio};
pub use probe::{DurationProbe, MetadataProbe};
