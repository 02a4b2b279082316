//! Configuration management for sonotag.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a partial file is fine.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for sonotag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// File discovery settings
    pub processing: ProcessingConfig,

    /// Audio normalization settings
    pub audio: AudioConfig,

    /// Encoder model settings
    pub embedding: EmbeddingConfig,

    /// Tagging settings
    pub tagging: TaggingConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.sonotag.sonotag/config.toml
    /// - Linux: ~/.config/sonotag/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\sonotag\config\config.toml
    ///
    /// Falls back to ~/.sonotag/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "sonotag", "sonotag")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".sonotag").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.general.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Get the resolved taxonomy path (with ~ expansion), if one is configured.
    pub fn taxonomy_path(&self) -> Option<PathBuf> {
        self.tagging
            .taxonomy_path
            .as_deref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.audio.target_sample_rate, 48_000);
        assert_eq!(config.audio.min_duration_seconds, 1.0);
        assert_eq!(config.tagging.top_k, 3);
        assert!(config.processing.recursive);
        assert_eq!(
            config.processing.supported_formats,
            vec!["wav".to_string(), "flac".to_string(), "ogg".to_string()]
        );
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[audio]"));
        assert!(toml.contains("[tagging]"));
        assert!(toml.contains("target_sample_rate = 48000"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tagging]\ntop_k = 5\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.tagging.top_k, 5);
        assert_eq!(config.audio.target_sample_rate, 48_000);
        assert_eq!(config.embedding.model, "clap-htsat-unfused");
    }

    #[test]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tagging]\ntop_k = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_load_from_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tagging\ntop_k = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_taxonomy_path_unset_by_default() {
        assert!(Config::default().taxonomy_path().is_none());
    }

    #[test]
    fn test_taxonomy_path_is_returned_when_set() {
        let mut config = Config::default();
        config.tagging.taxonomy_path = Some("/srv/labels.txt".to_string());
        assert_eq!(
            config.taxonomy_path(),
            Some(PathBuf::from("/srv/labels.txt"))
        );
    }
}
