//! Error types for the Veil anonymization pipeline.
//!
//! Fatal errors (bad configuration, missing model files) are raised before
//! any file is processed. Per-file pipeline errors carry the offending path
//! and are recoverable: the batch loop logs them and moves on.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Veil operations.
#[derive(Error, Debug)]
pub enum VeilError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Per-file pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors (fatal when raised during folder scanning)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors. All of these are fatal and surface before
/// the first image is touched.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    Validation(String),

    /// Unrecognized detector kind
    #[error("Unknown detector kind {kind:?} (expected \"seeta\" or \"ssd\")")]
    UnknownDetector { kind: String },

    /// A required model file is absent from the models directory
    #[error("Model file not found: {path}\nRun `veil models` for download instructions")]
    MissingModel { path: PathBuf },

    /// Model file exists but could not be loaded
    #[error("Failed to load model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },
}

/// Per-file processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Image encoding or writing failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Face detection failed at inference time
    #[error("Detection failed: {message}")]
    Detect { message: String },

    /// Watermark compositing failed
    #[error("Watermark error: {message}")]
    Watermark { message: String },
}

/// Convenience type alias for Veil results.
pub type Result<T> = std::result::Result<T, VeilError>;

/// Convenience type alias for per-file pipeline results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
