//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    ///
    /// `tagging.top_k` is only checked for being non-zero here; the upper
    /// bound depends on the taxonomy and is enforced when the ranker is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.audio.target_sample_rate == 0 {
            return Err(ConfigError::ValidationError(
                "audio.target_sample_rate must be > 0".into(),
            ));
        }
        if !self.audio.min_duration_seconds.is_finite() || self.audio.min_duration_seconds < 0.0 {
            return Err(ConfigError::ValidationError(
                "audio.min_duration_seconds must be a finite value >= 0".into(),
            ));
        }
        if self.embedding.text_max_length == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.text_max_length must be > 0".into(),
            ));
        }
        if self.embedding.text_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.text_batch_size must be > 0".into(),
            ));
        }
        if self.tagging.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "tagging.top_k must be >= 1".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.file_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.file_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}
