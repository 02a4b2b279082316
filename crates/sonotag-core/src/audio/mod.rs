//! Audio loading and normalization.
//!
//! - **decode**: read `.wav` / `.flac` / `.ogg` files into planar clips
//! - **normalize**: resample, pad and downmix into the encoder's input shape

pub mod decode;
pub mod normalize;

pub use decode::AudioDecoder;
pub use normalize::{downmix_mono, pad_tail, resample, AudioNormalizer};
