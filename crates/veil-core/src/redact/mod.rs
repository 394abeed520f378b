//! Pixel-region redaction: mosaic and Gaussian blur over face boxes.
//!
//! All region ops clip the box to the image first; a box fully outside the
//! image (or reduced to zero area by clipping) is a no-op, never an error.

mod filters;

pub use filters::{area_downsample, coerce_odd, gaussian_blur};

use std::str::FromStr;

use image::imageops;
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::config::ProcessingConfig;
use crate::error::ConfigError;
use crate::types::BoundingBox;

/// How detected face regions are redacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedactionMethod {
    Mosaic,
    Blur,
}

impl FromStr for RedactionMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mosaic" => Ok(RedactionMethod::Mosaic),
            "blur" => Ok(RedactionMethod::Blur),
            other => Err(ConfigError::Validation(format!(
                "unknown redaction method {other:?} (expected \"mosaic\" or \"blur\")"
            ))),
        }
    }
}

impl std::fmt::Display for RedactionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedactionMethod::Mosaic => write!(f, "mosaic"),
            RedactionMethod::Blur => write!(f, "blur"),
        }
    }
}

/// Apply a mosaic effect to a face region in place.
///
/// The region is downsampled to `max(1, w / block_size)` ×
/// `max(1, h / block_size)` cells by area averaging, upsampled back with
/// nearest-neighbor to produce the blocks, then lightly smoothed to soften
/// block edges.
///
/// Note the inverse relationship: a *smaller* `block_size` yields *larger*
/// visual blocks (a 100px region at `block_size = 10` collapses to 10
/// cells). This matches the shipped product's documented behavior and is
/// intentional.
pub fn apply_mosaic(image: &mut RgbImage, bbox: BoundingBox, block_size: u32) {
    let (img_w, img_h) = image.dimensions();
    let Some(region) = bbox.clip(img_w, img_h) else {
        return;
    };
    let block_size = block_size.max(1);

    let roi = imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image();

    let small_w = (region.width / block_size).max(1);
    let small_h = (region.height / block_size).max(1);
    let small = area_downsample(&roi, small_w, small_h);
    let mosaic = imageops::resize(
        &small,
        region.width,
        region.height,
        imageops::FilterType::Nearest,
    );

    // Soften the hard cell edges; stronger for small block sizes since
    // those produce the coarsest blocks.
    let blur_size = coerce_odd((block_size / 3).max(3));
    let softened = gaussian_blur(&mosaic, blur_size);

    imageops::replace(image, &softened, i64::from(region.x), i64::from(region.y));
}

/// Apply a Gaussian blur to a face region in place.
///
/// Even kernel sizes are coerced to the next odd value.
pub fn apply_blur(image: &mut RgbImage, bbox: BoundingBox, kernel_size: u32) {
    let (img_w, img_h) = image.dimensions();
    let Some(region) = bbox.clip(img_w, img_h) else {
        return;
    };

    let roi = imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image();
    let blurred = gaussian_blur(&roi, coerce_odd(kernel_size.max(1)));
    imageops::replace(image, &blurred, i64::from(region.x), i64::from(region.y));
}

/// Redact every box on an independent copy of `image`.
///
/// The source image is never mutated; boxes are applied in input order.
pub fn redact_faces(
    image: &RgbImage,
    boxes: &[BoundingBox],
    method: RedactionMethod,
    config: &ProcessingConfig,
) -> RgbImage {
    let mut result = image.clone();
    for &bbox in boxes {
        match method {
            RedactionMethod::Mosaic => apply_mosaic(&mut result, bbox, config.mosaic_block_size),
            RedactionMethod::Blur => apply_blur(&mut result, bbox, config.blur_kernel_size),
        }
    }
    result
}
