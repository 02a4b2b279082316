//! Flat brute-force cosine ranking against the label bank.

use std::sync::Arc;

use crate::error::{PipelineError, PipelineResult};
use crate::math::{dot, l2_normalize};
use crate::types::{RankedTag, RankingResult};

use super::label_bank::LabelBank;

/// Check that `k` tags can be drawn from `available` labels.
pub fn validate_top_k(k: usize, available: usize) -> PipelineResult<()> {
    if k == 0 || k > available {
        return Err(PipelineError::InvalidTopK { k, available });
    }
    Ok(())
}

/// Rank all labels by cosine similarity to `audio_embedding` and keep the top `k`.
///
/// Scores are clamped to [-1, 1]. Ties keep taxonomy order.
pub fn rank(audio_embedding: &[f32], bank: &LabelBank, k: usize) -> PipelineResult<RankingResult> {
    validate_top_k(k, bank.len())?;
    if audio_embedding.len() != bank.dim() {
        return Err(PipelineError::DimensionMismatch {
            expected: bank.dim(),
            actual: audio_embedding.len(),
        });
    }

    let audio = l2_normalize(audio_embedding);
    let mut scores: Vec<(usize, f32)> = bank
        .matrix()
        .chunks(bank.dim())
        .map(|row| dot(&audio, row).clamp(-1.0, 1.0))
        .enumerate()
        .collect();

    // Stable sort: equal scores stay in taxonomy order.
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let keys = bank.keys();
    Ok(RankingResult::new(
        scores
            .into_iter()
            .take(k)
            .map(|(idx, score)| RankedTag::new(keys[idx].clone(), score))
            .collect(),
    ))
}

/// Ranks audio embeddings against a shared label bank with a fixed `k`.
#[derive(Debug, Clone)]
pub struct SimilarityRanker {
    bank: Arc<LabelBank>,
    top_k: usize,
}

impl SimilarityRanker {
    /// Fails with [`PipelineError::InvalidTopK`] unless `1 <= top_k <= bank.len()`.
    pub fn new(bank: Arc<LabelBank>, top_k: usize) -> PipelineResult<Self> {
        validate_top_k(top_k, bank.len())?;
        Ok(Self { bank, top_k })
    }

    pub fn rank(&self, audio_embedding: &[f32]) -> PipelineResult<RankingResult> {
        rank(audio_embedding, &self.bank, self.top_k)
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn bank(&self) -> &LabelBank {
        &self.bank
    }
}
