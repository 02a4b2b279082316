//! Sonotag Core - zero-shot audio tagging library.
//!
//! Sonotag ranks sound-effect files against a fixed taxonomy of text labels
//! using a joint audio-text encoder. No training happens: label descriptions
//! and audio clips are embedded into one space and compared by cosine
//! similarity.
//!
//! # Architecture
//!
//! ```text
//! Taxonomy → embed_texts → LabelBank
//! Audio tree → Decode → Normalize → embed_audio → Rank (top-K) → CSV
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sonotag_core::{ClapEncoder, Config, Sonotag};
//!
//! #[tokio::main]
//! async fn main() -> sonotag_core::Result<()> {
//!     let config = Config::load()?;
//!     let encoder = ClapEncoder::load(&config.embedding, &config.model_dir())?;
//!     let sonotag = Sonotag::new(config, Arc::new(encoder))?;
//!
//!     let outcome = sonotag.classify("./sfx".as_ref(), true).await?;
//!     sonotag.write_report(&outcome.rows, "./audio_rankings.csv".as_ref())?;
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod config;
pub mod embedding;
pub mod error;
pub mod math;
pub mod pipeline;
pub mod ranking;
pub mod report;
pub mod taxonomy;
pub mod types;

pub use audio::{AudioDecoder, AudioNormalizer};
pub use config::Config;
pub use embedding::{ClapEncoder, EmbeddingProvider};
pub use error::{
    ConfigError, PipelineError, PipelineResult, ReportError, Result, SonotagError, TaxonomyError,
};
pub use pipeline::{BatchDriver, FileProgress};
pub use ranking::{LabelBank, SimilarityRanker};
pub use report::ReportWriter;
pub use taxonomy::{LabelEntry, TaxonomyStore};
pub use types::{
    AudioClip, BatchOutcome, Diagnostic, ProcessingStats, RankedTag, RankingResult, ReportRow,
};

use std::path::Path;
use std::sync::Arc;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A ready-to-run tagger: taxonomy resolved, labels encoded, driver built.
pub struct Sonotag {
    config: Config,
    taxonomy: Arc<TaxonomyStore>,
    bank: Arc<LabelBank>,
    driver: BatchDriver,
}

impl Sonotag {
    /// Resolve the taxonomy (falling back to the built-in set), encode its
    /// labels once, and validate `tagging.top_k` against the label count.
    pub fn new(config: Config, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        tracing::debug!("Initializing sonotag v{} ({})", VERSION, provider.name());

        let taxonomy = TaxonomyStore::resolve(
            config.taxonomy_path().as_deref(),
            TaxonomyStore::builtin(),
        )?;
        Self::with_taxonomy(config, taxonomy, provider)
    }

    /// Like [`Sonotag::new`] with an explicit taxonomy.
    pub fn with_taxonomy(
        config: Config,
        taxonomy: TaxonomyStore,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        check_sample_rate(&config, provider.as_ref())?;
        ranking::validate_top_k(config.tagging.top_k, taxonomy.len())?;

        let bank = Arc::new(LabelBank::encode(&taxonomy, provider.as_ref())?);
        let driver = BatchDriver::new(&config, provider, Arc::clone(&bank))?;

        Ok(Self {
            config,
            taxonomy: Arc::new(taxonomy),
            bank,
            driver,
        })
    }

    /// Classify every supported file under `root`.
    pub async fn classify(&self, root: &Path, recursive: bool) -> Result<BatchOutcome> {
        Ok(self.driver.run(root, recursive).await?)
    }

    /// Write rows as CSV with this tagger's column layout.
    pub fn write_report(&self, rows: &[ReportRow], destination: &Path) -> Result<()> {
        Ok(ReportWriter::new(self.driver.top_k()).write(rows, destination)?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn taxonomy(&self) -> &TaxonomyStore {
        &self.taxonomy
    }

    pub fn label_bank(&self) -> &LabelBank {
        &self.bank
    }

    pub fn driver(&self) -> &BatchDriver {
        &self.driver
    }
}

/// Reject a target sample rate the encoder cannot take.
fn check_sample_rate(config: &Config, provider: &dyn EmbeddingProvider) -> Result<()> {
    match provider.sample_rate() {
        Some(required) if required != config.audio.target_sample_rate => {
            Err(ConfigError::ValidationError(format!(
                "audio.target_sample_rate is {} Hz but encoder {} requires {} Hz",
                config.audio.target_sample_rate,
                provider.name(),
                required
            ))
            .into())
        }
        _ => Ok(()),
    }
}
