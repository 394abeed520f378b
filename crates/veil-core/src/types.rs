//! Core data types shared across the pipeline.

use serde::{Deserialize, Serialize};

/// Axis-aligned face bounding box in image-relative pixel coordinates.
///
/// Coordinates are signed: raw detector output may place an origin slightly
/// outside the image. Every consumer clips through [`BoundingBox::clip`]
/// before touching pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// A bounding box clipped to image bounds; guaranteed non-degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClippedBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersect with an `img_w × img_h` image.
    ///
    /// Returns `None` when the intersection is empty or the box is
    /// degenerate (`width <= 0` or `height <= 0`) — callers treat that as
    /// a no-op, never an error.
    pub fn clip(&self, img_w: u32, img_h: u32) -> Option<ClippedBox> {
        if self.width <= 0 || self.height <= 0 {
            return None;
        }
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width).min(img_w as i64);
        let y1 = (self.y + self.height).min(img_h as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(ClippedBox {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

/// Statistics for one batch run.
///
/// Created fresh at the start of `process_folder`, mutated only by the
/// batch loop, read-only once returned.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchStats {
    /// Files attempted (after any license truncation)
    pub total: usize,

    /// Files processed and saved successfully
    pub success: usize,

    /// Files that failed decode/detect/save
    pub failed: usize,

    /// Files that succeeded but contained no detectable face
    pub skipped_no_face: usize,

    /// Total faces detected across the batch
    pub faces_detected: usize,

    /// Wall-clock time for the whole batch in seconds
    pub elapsed_secs: f64,
}
