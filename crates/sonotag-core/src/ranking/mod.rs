//! Zero-shot ranking of audio embeddings against taxonomy labels.
//!
//! - **label_bank**: label embeddings, encoded once per run
//! - **ranker**: cosine scoring and top-K selection

pub mod label_bank;
pub mod ranker;

pub use label_bank::LabelBank;
pub use ranker::{rank, validate_top_k, SimilarityRanker};
