//! Pre-computed label embeddings for fast scoring.
//!
//! The label bank stores a flat N×dim matrix of unit-length text embeddings
//! (one row per taxonomy label, in taxonomy order) that is dot-producted
//! against audio embeddings.

use crate::embedding::EmbeddingProvider;
use crate::error::{PipelineError, PipelineResult};
use crate::math::l2_normalize_in_place;
use crate::taxonomy::TaxonomyStore;

/// Unit-length label embeddings keyed by taxonomy order.
#[derive(Debug, Clone)]
pub struct LabelBank {
    keys: Vec<String>,
    /// Flat matrix: N × dim stored row-major.
    matrix: Vec<f32>,
    dim: usize,
}

impl LabelBank {
    /// Encode every description in the store with a single `embed_texts` call.
    pub fn encode(store: &TaxonomyStore, provider: &dyn EmbeddingProvider) -> PipelineResult<Self> {
        tracing::info!(
            "Encoding {} label descriptions with {}",
            store.len(),
            provider.name()
        );
        let embeddings = provider.embed_texts(&store.descriptions())?;

        if embeddings.len() != store.len() {
            return Err(PipelineError::Model {
                message: format!(
                    "Encoder returned {} embeddings for {} labels",
                    embeddings.len(),
                    store.len()
                ),
            });
        }

        let bank = Self::from_rows(store.keys(), embeddings)?;
        tracing::info!(
            "Label bank ready: {} labels x {} dims",
            bank.len(),
            bank.dim()
        );
        Ok(bank)
    }

    /// Build a bank from one embedding per key. Rows are L2-normalized.
    pub fn from_rows(keys: Vec<String>, rows: Vec<Vec<f32>>) -> PipelineResult<Self> {
        if keys.len() != rows.len() {
            return Err(PipelineError::Model {
                message: format!("{} keys but {} embeddings", keys.len(), rows.len()),
            });
        }
        let dim = rows.first().map_or(0, Vec::len);
        if rows.is_empty() || dim == 0 {
            return Err(PipelineError::Model {
                message: "Label bank needs at least one non-empty embedding".to_string(),
            });
        }

        let mut matrix = Vec::with_capacity(rows.len() * dim);
        for (key, mut row) in keys.iter().zip(rows) {
            if row.len() != dim {
                return Err(PipelineError::Model {
                    message: format!(
                        "Embedding for {:?} has {} dims, expected {}",
                        key,
                        row.len(),
                        dim
                    ),
                });
            }
            l2_normalize_in_place(&mut row);
            matrix.extend_from_slice(&row);
        }

        Ok(Self { keys, matrix, dim })
    }

    /// Build a bank from a flat row-major matrix.
    pub fn from_raw(keys: Vec<String>, matrix: Vec<f32>, dim: usize) -> PipelineResult<Self> {
        if dim == 0 || matrix.len() != keys.len() * dim {
            return Err(PipelineError::Model {
                message: format!(
                    "Matrix size ({}) does not match {} labels x {} dim",
                    matrix.len(),
                    keys.len(),
                    dim
                ),
            });
        }
        let rows = matrix.chunks(dim).map(<[f32]>::to_vec).collect();
        Self::from_rows(keys, rows)
    }

    /// Label keys in taxonomy order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The flat matrix for batch dot products.
    pub fn matrix(&self) -> &[f32] {
        &self.matrix
    }

    /// One label's unit-length embedding.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        self.matrix.chunks(self.dim).nth(index)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
