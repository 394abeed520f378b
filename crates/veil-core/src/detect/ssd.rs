//! SSD face detection through ONNX Runtime.
//!
//! Runs a 300×300 single-shot detector (ResNet-10 SSD). The network expects
//! BGR channel order with fixed per-channel means subtracted, and emits
//! candidate rows `[batch, class, score, x1, y1, x2, y2]` with box
//! coordinates normalized to `[0, 1]`.

use std::path::Path;
use std::sync::Mutex;

use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::config::DetectorConfig;
use crate::error::{ConfigError, PipelineError, PipelineResult};
use crate::types::BoundingBox;

use super::FaceDetector;

/// Fixed network input edge length.
const INPUT_SIZE: u32 = 300;

/// Per-channel means in BGR order, matching the training preprocessing.
const MEAN_BGR: [f32; 3] = [104.0, 177.0, 123.0];

/// SSD detector with a session reused across the whole batch.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
#[derive(Debug)]
pub struct SsdDetector {
    session: Mutex<Session>,
    input_name: String,
    confidence_threshold: f32,
}

impl SsdDetector {
    /// Network topology file expected under the models directory.
    pub const MODEL_FILE: &'static str = "ssd_face_300.onnx";
    /// External weights file expected next to the topology.
    pub const WEIGHTS_FILE: &'static str = "ssd_face_300.onnx.data";

    pub fn new(config: &DetectorConfig, model_dir: &Path) -> Result<Self, ConfigError> {
        let model_path = model_dir.join(Self::MODEL_FILE);
        let weights_path = model_dir.join(Self::WEIGHTS_FILE);
        if !model_path.is_file() {
            return Err(ConfigError::MissingModel { path: model_path });
        }
        if !weights_path.is_file() {
            return Err(ConfigError::MissingModel { path: weights_path });
        }

        let session = Session::builder()
            .map_err(|e| ConfigError::ModelLoad {
                path: model_path.clone(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(&model_path)
            .map_err(|e| ConfigError::ModelLoad {
                path: model_path.clone(),
                message: format!("Failed to load ONNX model: {e}"),
            })?;

        // Detect the input tensor name from model metadata.
        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "data".to_string());

        tracing::debug!(
            "Loaded SSD face model from {:?} (input: {:?})",
            model_path,
            input_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            confidence_threshold: config.confidence_threshold,
        })
    }
}

impl FaceDetector for SsdDetector {
    fn detect(&self, image: &RgbImage) -> PipelineResult<Vec<BoundingBox>> {
        let (img_w, img_h) = image.dimensions();
        let tensor = preprocess(image);

        let shape: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = tensor.iter().copied().collect();
        let input_value =
            Value::from_array((shape, flat_data)).map_err(|e| PipelineError::Detect {
                message: format!("Failed to create input tensor: {e}"),
            })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self.session.lock().map_err(|e| PipelineError::Detect {
            message: format!("Session lock poisoned: {e}"),
        })?;
        let outputs = session.run(inputs).map_err(|e| PipelineError::Detect {
            message: format!("ONNX inference failed: {e}"),
        })?;

        let detections = outputs.iter().next().ok_or_else(|| PipelineError::Detect {
            message: "Model produced no outputs".to_string(),
        })?;
        let (_, data) =
            detections
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::Detect {
                    message: format!("Failed to extract detection tensor: {e}"),
                })?;

        Ok(decode_detections(
            data,
            self.confidence_threshold,
            img_w,
            img_h,
        ))
    }
}

/// Resize to 300×300 and build the NCHW tensor in BGR order with means
/// subtracted.
fn preprocess(image: &RgbImage) -> Array4<f32> {
    let resized = image::imageops::resize(
        image,
        INPUT_SIZE,
        INPUT_SIZE,
        image::imageops::FilterType::Triangle,
    );

    let size = INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    let raw = resized.as_raw();
    let tensor_data = tensor.as_slice_mut().unwrap();
    for (i, pixel) in raw.chunks_exact(3).enumerate() {
        // Pixel bytes are RGB; the network wants BGR planes.
        let bgr = [pixel[2], pixel[1], pixel[0]];
        for (c, &val) in bgr.iter().enumerate() {
            // NCHW layout: offset = c * size * size + i
            tensor_data[c * size * size + i] = f32::from(val) - MEAN_BGR[c];
        }
    }
    tensor
}

/// Convert raw detection rows into clipped pixel-space bounding boxes.
///
/// Each row is `[_, _, score, x1, y1, x2, y2]` with coordinates in `[0, 1]`.
/// Rows at or below `threshold` and boxes with an empty intersection with
/// the image are dropped.
fn decode_detections(data: &[f32], threshold: f32, img_w: u32, img_h: u32) -> Vec<BoundingBox> {
    let mut faces = Vec::new();
    for row in data.chunks_exact(7) {
        let score = row[2];
        if score <= threshold {
            continue;
        }
        let x1 = (row[3] * img_w as f32) as i64;
        let y1 = (row[4] * img_h as f32) as i64;
        let x2 = (row[5] * img_w as f32) as i64;
        let y2 = (row[6] * img_h as f32) as i64;
        let raw = BoundingBox::new(x1, y1, x2 - x1, y2 - y1);
        // Clamp negative origins to 0 and shrink so the box never exceeds
        // the image.
        if let Some(c) = raw.clip(img_w, img_h) {
            faces.push(BoundingBox::new(
                i64::from(c.x),
                i64::from(c.y),
                i64::from(c.width),
                i64::from(c.height),
            ));
        }
    }
    faces
}
