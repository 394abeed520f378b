//! Face detection.
//!
//! Detection is a single capability seam: [`FaceDetector::detect`] takes an
//! image and returns face bounding boxes. Two backends implement it — a
//! classical SeetaFace cascade (`seeta`) and a 300×300 SSD network run
//! through ONNX Runtime (`ssd`) — selected by [`build_detector`].

mod seeta;
mod ssd;

pub use seeta::SeetaDetector;
pub use ssd::SsdDetector;

use std::path::Path;
use std::str::FromStr;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::config::DetectorConfig;
use crate::error::{ConfigError, PipelineResult};
use crate::types::BoundingBox;

/// Detects faces in an image.
///
/// Implementations never mutate the input and return an empty vector when
/// nothing is found — an absence of faces is not an error. Implementations
/// must be safe to call repeatedly on the same instance; the loaded model
/// is the only long-lived state and is reused across a whole batch.
pub trait FaceDetector: Send + Sync + std::fmt::Debug {
    fn detect(&self, image: &RgbImage) -> PipelineResult<Vec<BoundingBox>>;
}

/// Which detector backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// Classical SeetaFace cascade, no GPU or runtime needed
    Seeta,
    /// SSD network via ONNX Runtime, better recall on hard poses
    Ssd,
}

impl FromStr for DetectorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "haar" and "dnn" are accepted for compatibility with older configs
        match s.to_lowercase().as_str() {
            "seeta" | "haar" => Ok(DetectorKind::Seeta),
            "ssd" | "dnn" => Ok(DetectorKind::Ssd),
            other => Err(ConfigError::UnknownDetector {
                kind: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorKind::Seeta => write!(f, "seeta"),
            DetectorKind::Ssd => write!(f, "ssd"),
        }
    }
}

/// Construct the detector backend for `kind`.
///
/// Fails fast with [`ConfigError::MissingModel`] when the backend's model
/// files are absent from `model_dir`, before any image is processed.
pub fn build_detector(
    kind: DetectorKind,
    config: &DetectorConfig,
    model_dir: &Path,
) -> Result<Box<dyn FaceDetector>, ConfigError> {
    match kind {
        DetectorKind::Seeta => Ok(Box::new(SeetaDetector::new(config, model_dir)?)),
        DetectorKind::Ssd => Ok(Box::new(SsdDetector::new(config, model_dir)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str_with_aliases() {
        assert_eq!(DetectorKind::from_str("seeta").unwrap(), DetectorKind::Seeta);
        assert_eq!(DetectorKind::from_str("haar").unwrap(), DetectorKind::Seeta);
        assert_eq!(DetectorKind::from_str("SSD").unwrap(), DetectorKind::Ssd);
        assert_eq!(DetectorKind::from_str("dnn").unwrap(), DetectorKind::Ssd);
    }

    #[test]
    fn test_kind_from_str_rejects_unknown() {
        let err = DetectorKind::from_str("yolo").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDetector { ref kind } if kind == "yolo"));
    }

    #[test]
    fn test_build_detector_fails_without_models() {
        let dir = tempfile::tempdir().unwrap();
        let config = DetectorConfig::default();
        for kind in [DetectorKind::Seeta, DetectorKind::Ssd] {
            let err = build_detector(kind, &config, dir.path()).unwrap_err();
            assert!(matches!(err, ConfigError::MissingModel { .. }));
        }
    }
}
