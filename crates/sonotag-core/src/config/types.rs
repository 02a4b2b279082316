//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where encoder models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.sonotag/models"),
        }
    }
}

/// File discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Audio file extensions to pick up (case-insensitive, no dot)
    pub supported_formats: Vec<String>,

    /// Walk subdirectories of the audio root
    pub recursive: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec!["wav".to_string(), "flac".to_string(), "ogg".to_string()],
            recursive: true,
        }
    }
}

/// Audio normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate the encoder expects (CLAP uses 48 kHz)
    pub target_sample_rate: u32,

    /// Clips shorter than this are zero-padded at the end
    pub min_duration_seconds: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 48_000,
            min_duration_seconds: 1.0,
        }
    }
}

/// Encoder model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model name; files live under `{model_dir}/{model}/`
    pub model: String,

    /// Maximum token length for label descriptions
    pub text_max_length: usize,

    /// Descriptions encoded per text-tower inference call
    pub text_batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "clap-htsat-unfused".to_string(),
            text_max_length: 77,
            text_batch_size: 32,
        }
    }
}

/// Tagging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggingConfig {
    /// Number of tags reported per file
    pub top_k: usize,

    /// Taxonomy file (`a__b__label: description` lines).
    /// When unset, missing or empty, the built-in taxonomy is used.
    pub taxonomy_path: Option<String>,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            taxonomy_path: None,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Deadline for decoding, normalizing and embedding a single file
    pub file_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 512,
            file_timeout_ms: 60_000,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default report destination
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("audio_rankings.csv"),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
