//! Watermark compositing: load a logo, fit-resize it, anchor it to a
//! corner, and alpha-blend it onto the target image.

use std::path::Path;
use std::str::FromStr;

use image::{Rgba, RgbaImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, PipelineError, PipelineResult};
use crate::redact::area_downsample;

/// Corner the logo is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl FromStr for Placement {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bottom-right" => Ok(Placement::BottomRight),
            "bottom-left" => Ok(Placement::BottomLeft),
            "top-right" => Ok(Placement::TopRight),
            "top-left" => Ok(Placement::TopLeft),
            other => Err(ConfigError::Validation(format!(
                "unknown watermark position {other:?}"
            ))),
        }
    }
}

/// A loaded logo asset, immutable once constructed. Resized copies are
/// derived per target image; the original buffer is never mutated.
#[derive(Debug)]
pub struct Logo {
    image: RgbaImage,
    has_alpha: bool,
}

impl Logo {
    /// Load a logo from disk, preserving an alpha channel if present.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let decoded = image::open(path).map_err(|e| PipelineError::Watermark {
            message: format!("Failed to load logo {}: {}", path.display(), e),
        })?;
        let has_alpha = decoded.color().has_alpha();
        Ok(Self {
            image: decoded.to_rgba8(),
            has_alpha,
        })
    }

    /// Wrap an in-memory buffer (used by tests and embedders).
    pub fn from_rgba(image: RgbaImage, has_alpha: bool) -> Self {
        Self { image, has_alpha }
    }

    /// Procedurally generated translucent badge used when the free tier
    /// forces a watermark and no logo file is configured.
    pub fn default_badge() -> Self {
        let w = 240;
        let h = 80;
        let image = RgbaImage::from_fn(w, h, |x, y| {
            // Rounded-rectangle mask with a diagonal stripe texture.
            let r = 12i64;
            let cx = (x as i64).clamp(r, w as i64 - 1 - r);
            let cy = (y as i64).clamp(r, h as i64 - 1 - r);
            let dx = x as i64 - cx;
            let dy = y as i64 - cy;
            if dx * dx + dy * dy > r * r {
                return Rgba([0, 0, 0, 0]);
            }
            let stripe = (x + y) / 10 % 2 == 0;
            let shade = if stripe { 40 } else { 70 };
            Rgba([shade, shade, shade, 110])
        });
        Self {
            image,
            has_alpha: true,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Compute a scale-based target size: `floor(base * scale)` per axis,
/// minimum 1 each.
pub fn scaled_target(base_w: u32, base_h: u32, scale: f32) -> (u32, u32) {
    let w = ((base_w as f32 * scale) as u32).max(1);
    let h = ((base_h as f32 * scale) as u32).max(1);
    (w, h)
}

/// Fit a `logo_w × logo_h` asset inside `target_w × target_h` preserving
/// aspect ratio: whichever axis constraint yields the smaller bounding
/// size wins (fit-inside, not stretch).
pub fn fit_size(logo_w: u32, logo_h: u32, target_w: u32, target_h: u32) -> (u32, u32) {
    let aspect = logo_w as f64 / logo_h as f64;
    if target_w as f64 / target_h as f64 > aspect {
        // Height-constrained
        let h = target_h;
        let w = ((target_h as f64 * aspect) as u32).max(1);
        (w, h)
    } else {
        // Width-constrained
        let w = target_w;
        let h = ((target_w as f64 / aspect) as u32).max(1);
        (w, h)
    }
}

/// Resize a logo buffer: area-averaging when shrinking, bilinear otherwise.
fn resize_rgba(src: &RgbaImage, w: u32, h: u32) -> RgbaImage {
    let (sw, sh) = src.dimensions();
    if (w, h) == (sw, sh) {
        return src.clone();
    }
    if w <= sw && h <= sh {
        area_downsample(src, w, h)
    } else {
        image::imageops::resize(src, w, h, image::imageops::FilterType::Triangle)
    }
}

/// Composite `logo` onto `image` in place.
///
/// The logo is scaled to a fraction of the image, fit-resized to preserve
/// its aspect ratio, anchored to the chosen corner minus `margin`, shrunk
/// further if it would spill past the right or bottom edge, and blended
/// with `opacity`. Never writes a pixel outside the image; a logo reduced
/// to zero area leaves the image unchanged.
pub fn add_logo(
    image: &mut RgbImage,
    logo: &Logo,
    position: Placement,
    scale: f32,
    margin: u32,
    opacity: f32,
) {
    let (img_w, img_h) = image.dimensions();
    let (logo_w, logo_h) = logo.dimensions();

    let (target_w, target_h) = scaled_target(img_w, img_h, scale);
    let (fit_w, fit_h) = fit_size(logo_w, logo_h, target_w, target_h);
    let mut resized = resize_rgba(&logo.image, fit_w, fit_h);
    let (mut lw, mut lh) = resized.dimensions();

    let margin = i64::from(margin);
    let (x, y) = match position {
        Placement::BottomRight => (
            i64::from(img_w) - i64::from(lw) - margin,
            i64::from(img_h) - i64::from(lh) - margin,
        ),
        Placement::BottomLeft => (margin, i64::from(img_h) - i64::from(lh) - margin),
        Placement::TopRight => (i64::from(img_w) - i64::from(lw) - margin, margin),
        Placement::TopLeft => (margin, margin),
    };
    // Clip the anchor point into the image
    let x = x.clamp(0, i64::from(img_w) - 1) as u32;
    let y = y.clamp(0, i64::from(img_h) - 1) as u32;

    // Shrink to exactly fit the remaining space past the anchor
    if x + lw > img_w {
        lw = img_w - x;
        resized = resize_rgba(&resized, lw.max(1), lh);
    }
    if y + lh > img_h {
        lh = img_h - y;
        resized = resize_rgba(&resized, lw.max(1), lh.max(1));
    }
    if lw == 0 || lh == 0 {
        return;
    }

    blend(image, &resized, x, y, logo.has_alpha, opacity);
}

/// Per-pixel blend of the resized logo into the destination region.
fn blend(image: &mut RgbImage, logo: &RgbaImage, x: u32, y: u32, has_alpha: bool, opacity: f32) {
    let (lw, lh) = logo.dimensions();
    for dy in 0..lh {
        for dx in 0..lw {
            let lp = logo.get_pixel(dx, dy);
            let dst = image.get_pixel_mut(x + dx, y + dy);
            if has_alpha {
                let alpha = f32::from(lp[3]) / 255.0 * opacity;
                for c in 0..3 {
                    let blended =
                        f32::from(dst[c]) * (1.0 - alpha) + f32::from(lp[c]) * alpha;
                    dst[c] = blended.round().clamp(0.0, 255.0) as u8;
                }
            } else if opacity < 1.0 {
                for c in 0..3 {
                    let blended =
                        f32::from(dst[c]) * (1.0 - opacity) + f32::from(lp[c]) * opacity;
                    dst[c] = blended.round().clamp(0.0, 255.0) as u8;
                }
            } else {
                dst[0] = lp[0];
                dst[1] = lp[1];
                dst[2] = lp[2];
            }
        }
    }
}
