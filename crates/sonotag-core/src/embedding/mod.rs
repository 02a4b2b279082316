//! Embedding generation for audio clips and label descriptions.
//!
//! [`EmbeddingProvider`] is the seam between the pipeline and a pretrained
//! joint audio-text encoder. [`ClapEncoder`] is the ONNX-backed implementation;
//! tests inject deterministic stubs.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sonotag_core::config::Config;
//! use sonotag_core::embedding::{ClapEncoder, EmbeddingProvider};
//!
//! let config = Config::default();
//! let encoder = ClapEncoder::load(&config.embedding, &config.model_dir())?;
//! let vectors = encoder.embed_texts(&["heavy door slam".to_string()])?;
//! ```

pub mod clap;
pub mod features;

pub use clap::ClapEncoder;
pub use features::MelFrontend;

use crate::error::PipelineResult;
use crate::types::AudioClip;

/// A pretrained encoder mapping text and audio into one vector space.
///
/// Returned vectors need not be normalized; callers L2-normalize before
/// comparing.
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Input sample rate `embed_audio` requires, if the encoder has one.
    fn sample_rate(&self) -> Option<u32> {
        None
    }

    /// Embed label descriptions, one vector per input, in input order.
    fn embed_texts(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>>;

    /// Embed a normalized (target-rate, mono) clip.
    fn embed_audio(&self, clip: &AudioClip) -> PipelineResult<Vec<f32>>;
}
