//! Sub-configuration structs with defaults matching the shipped product.

use crate::detect::DetectorKind;
use crate::redact::RedactionMethod;
use crate::watermark::Placement;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where detector models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.veil/models"),
        }
    }
}

/// Per-file processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Which face detector to use
    pub detector: DetectorKind,

    /// Redaction method applied to detected faces
    pub method: RedactionMethod,

    /// Mosaic block size in pixels. Smaller values produce larger visual
    /// blocks (the region is downsampled to roughly `size / block_size`
    /// cells before upsampling).
    pub mosaic_block_size: u32,

    /// Gaussian blur kernel size; even values are coerced to the next odd.
    pub blur_kernel_size: u32,

    /// JPEG save quality (1-100)
    pub save_quality: u8,

    /// Supported input extensions (matched case-insensitively)
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            detector: DetectorKind::Ssd,
            method: RedactionMethod::Mosaic,
            mosaic_block_size: 10,
            blur_kernel_size: 51,
            save_quality: 95,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "bmp".to_string(),
                "webp".to_string(),
            ],
        }
    }
}

/// Face detector tuning.
///
/// `confidence_threshold` applies to the SSD detector; `scale_factor`,
/// `min_neighbors` and `min_face_size` apply to the classical detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum SSD score to accept a candidate detection (0.0 - 1.0)
    pub confidence_threshold: f32,

    /// Image pyramid scale step for the classical detector (> 1.0)
    pub scale_factor: f32,

    /// Minimum neighboring detections required by the classical detector
    pub min_neighbors: u32,

    /// Minimum face size in pixels for the classical detector
    pub min_face_size: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            scale_factor: 1.1,
            min_neighbors: 5,
            min_face_size: 30,
        }
    }
}

/// Watermark / logo settings.
///
/// `logo_path = None` means no user-configured watermark; the free tier
/// still forces a generated badge through the license gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// Path to a logo image (PNG with alpha recommended)
    pub logo_path: Option<PathBuf>,

    /// Corner the logo is anchored to
    pub position: Placement,

    /// Logo size as a fraction of the target image (0.0 - 1.0)
    pub scale: f32,

    /// Margin from the anchored corner in pixels
    pub margin: u32,

    /// Logo opacity (0.0 - 1.0)
    pub opacity: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            logo_path: None,
            position: Placement::BottomRight,
            scale: 0.2,
            margin: 20,
            opacity: 1.0,
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
