//! Error types for the sonotag tagging pipeline.
//!
//! Errors are organized by stage so messages carry the context an operator
//! needs (file paths, stage names, the offending values).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for sonotag operations.
#[derive(Error, Debug)]
pub enum SonotagError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Taxonomy loading errors
    #[error("Taxonomy error: {0}")]
    Taxonomy(#[from] TaxonomyError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Report output errors
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Failures loading a taxonomy source.
#[derive(Error, Debug)]
pub enum TaxonomyError {
    /// The taxonomy file does not exist
    #[error("Taxonomy source not found: {0}")]
    NotFound(PathBuf),

    /// The taxonomy file exists but could not be read
    #[error("Failed to read taxonomy {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Batch root is missing or not a directory
    #[error("Audio directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// File has zero bytes
    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    /// Audio decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Resampling, padding or downmixing failed
    #[error("Normalization failed for {path}: {message}")]
    Normalize { path: PathBuf, message: String },

    /// The encoder could not embed an audio clip
    #[error("Encoding failed for {path}: {message}")]
    Encoding { path: PathBuf, message: String },

    /// Model loading or text encoding failed
    #[error("Model error: {message}")]
    Model { message: String },

    /// Requested more tags than the taxonomy holds
    #[error("Invalid top_k {k}: must be between 1 and {available} (number of labels)")]
    InvalidTopK { k: usize, available: usize },

    /// Audio and label embeddings live in different dimensions
    #[error("Embedding dimension mismatch: labels are {expected}-d, audio is {actual}-d")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },
}

/// Report serialization errors.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Destination could not be opened for writing
    #[error("Cannot write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding or flushing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row carries a different number of tags than the header declares
    #[error("Row {relative_path} has {actual} tags, expected {expected}")]
    RowWidth {
        relative_path: String,
        expected: usize,
        actual: usize,
    },
}

/// Convenience type alias for sonotag results.
pub type Result<T> = std::result::Result<T, SonotagError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
