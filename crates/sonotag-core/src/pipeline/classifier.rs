//! Per-file unit of work: validate, decode, normalize, embed, rank.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::audio::{AudioDecoder, AudioNormalizer};
use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::error::PipelineResult;
use crate::ranking::{LabelBank, SimilarityRanker};
use crate::types::{RankingResult, ReportRow};

use super::discovery::DiscoveredFile;
use super::validate::Validator;

/// Classifies a single audio file against the label bank.
///
/// Synchronous and CPU-bound; the batch driver runs it on the blocking pool.
pub struct FileClassifier {
    validator: Validator,
    decoder: AudioDecoder,
    normalizer: AudioNormalizer,
    provider: Arc<dyn EmbeddingProvider>,
    ranker: SimilarityRanker,
}

impl FileClassifier {
    /// Build a classifier from config.
    ///
    /// Fails with `InvalidTopK` if `tagging.top_k` is 0 or exceeds the label count.
    pub fn new(
        config: &Config,
        provider: Arc<dyn EmbeddingProvider>,
        bank: Arc<LabelBank>,
    ) -> PipelineResult<Self> {
        Ok(Self {
            validator: Validator::new(&config.limits),
            decoder: AudioDecoder::new(),
            normalizer: AudioNormalizer::from_config(&config.audio),
            provider,
            ranker: SimilarityRanker::new(bank, config.tagging.top_k)?,
        })
    }

    pub fn top_k(&self) -> usize {
        self.ranker.top_k()
    }

    /// Classify a discovered file into a report row.
    pub fn classify(&self, file: &DiscoveredFile) -> PipelineResult<ReportRow> {
        let tags = self.classify_path(&file.path)?;
        Ok(ReportRow {
            relative_path: file.relative_path.clone(),
            tags,
        })
    }

    /// Run the full per-file pipeline on one path.
    pub fn classify_path(&self, path: &Path) -> PipelineResult<RankingResult> {
        let start = Instant::now();
        tracing::debug!("Classifying: {:?}", path);

        self.validator.validate(path)?;
        tracing::trace!("  Validate: {:?}", start.elapsed());

        let decode_start = Instant::now();
        let raw = self.decoder.decode(path)?;
        tracing::trace!("  Decode: {:?}", decode_start.elapsed());

        let normalize_start = Instant::now();
        let clip = self.normalizer.normalize(&raw)?;
        tracing::trace!("  Normalize: {:?}", normalize_start.elapsed());

        let embed_start = Instant::now();
        let embedding = self.provider.embed_audio(&clip)?;
        tracing::trace!("  Embed: {:?}", embed_start.elapsed());

        let tags = self.ranker.rank(&embedding)?;

        tracing::debug!(
            "Classified {:?} in {:?} (best: {})",
            path,
            start.elapsed(),
            tags.best().map_or("-", |t| t.label_key.as_str())
        );
        Ok(tags)
    }
}
