//! Classical face detection backed by the `rustface` SeetaFace engine.

use std::io::Cursor;
use std::path::Path;

use image::RgbImage;

use crate::config::DetectorConfig;
use crate::error::{ConfigError, PipelineResult};
use crate::types::BoundingBox;

use super::FaceDetector;

/// Cascade-style detector over an image pyramid.
///
/// The model is loaded once at construction; a fresh scan window is created
/// per call because the underlying `rustface::Detector` is not `Sync`.
pub struct SeetaDetector {
    model: rustface::Model,
    min_face_size: u32,
    score_thresh: f64,
    pyramid_scale: f32,
}

impl std::fmt::Debug for SeetaDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeetaDetector")
            .field("min_face_size", &self.min_face_size)
            .field("score_thresh", &self.score_thresh)
            .field("pyramid_scale", &self.pyramid_scale)
            .finish_non_exhaustive()
    }
}

impl SeetaDetector {
    /// Model file expected under the models directory.
    pub const MODEL_FILE: &'static str = "seeta_fd_frontal_v1.0.bin";

    pub fn new(config: &DetectorConfig, model_dir: &Path) -> Result<Self, ConfigError> {
        let path = model_dir.join(Self::MODEL_FILE);
        if !path.is_file() {
            return Err(ConfigError::MissingModel { path });
        }
        let bytes = std::fs::read(&path).map_err(|e| ConfigError::ModelLoad {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let model =
            rustface::read_model(Cursor::new(bytes)).map_err(|e| ConfigError::ModelLoad {
                path,
                message: e.to_string(),
            })?;

        Ok(Self {
            model,
            min_face_size: config.min_face_size,
            score_thresh: score_thresh(config.min_neighbors),
            pyramid_scale: pyramid_scale(config.scale_factor),
        })
    }
}

/// Map the configured pyramid step (> 1.0, shrink per level) onto
/// rustface's scale factor (< 1.0, ratio between levels).
fn pyramid_scale(scale_factor: f32) -> f32 {
    (1.0 / scale_factor).clamp(0.1, 0.99)
}

/// Map a minimum-neighbors count onto a SeetaFace score threshold.
///
/// The default of 5 neighbors lands on 2.0, the engine's recommended value.
fn score_thresh(min_neighbors: u32) -> f64 {
    f64::from(min_neighbors) * 0.4
}

impl FaceDetector for SeetaDetector {
    fn detect(&self, image: &RgbImage) -> PipelineResult<Vec<BoundingBox>> {
        // The engine wants a grayscale buffer; the input stays untouched.
        let gray = image::imageops::grayscale(image);
        let (width, height) = gray.dimensions();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(self.score_thresh);
        detector.set_pyramid_scale_factor(self.pyramid_scale);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                BoundingBox::new(
                    i64::from(bbox.x()),
                    i64::from(bbox.y()),
                    i64::from(bbox.width()),
                    i64::from(bbox.height()),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pyramid_scale_inverts_and_clamps() {
        assert!((pyramid_scale(1.1) - 1.0 / 1.1).abs() < 1e-6);
        assert!((pyramid_scale(2.0) - 0.5).abs() < 1e-6);
        // Extreme steps clamp into the engine's valid range
        assert!((pyramid_scale(100.0) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_score_thresh_defaults_to_engine_recommendation() {
        assert!((score_thresh(5) - 2.0).abs() < 1e-9);
        assert_eq!(score_thresh(0), 0.0);
    }

    #[test]
    fn test_missing_model_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SeetaDetector::new(&DetectorConfig::default(), dir.path()).unwrap_err();
        match err {
            ConfigError::MissingModel { path } => {
                assert!(path.ends_with(SeetaDetector::MODEL_FILE));
            }
            other => panic!("expected MissingModel, got {other:?}"),
        }
    }
}
