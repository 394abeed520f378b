//! Pixel filters used by the redaction ops: area-averaging downsample and
//! kernel-sized Gaussian blur.
//!
//! The `image` crate's resize filters do not include true area averaging,
//! and its `blur` takes a sigma rather than a kernel size, so both are
//! implemented here with the exact semantics the redaction contract needs.

use image::{ImageBuffer, Pixel, RgbImage};

/// Coerce a kernel size to the next odd value (even `k` becomes `k + 1`,
/// odd `k` is unchanged). Idempotent.
pub fn coerce_odd(k: u32) -> u32 {
    if k % 2 == 0 {
        k + 1
    } else {
        k
    }
}

/// Downsample by averaging each target pixel over the source rectangle it
/// covers. Only meaningful for `dst <= src` on both axes.
pub fn area_downsample<P>(src: &ImageBuffer<P, Vec<u8>>, dst_w: u32, dst_h: u32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (src_w, src_h) = src.dimensions();
    let channels = P::CHANNEL_COUNT as usize;
    let mut dst = ImageBuffer::new(dst_w, dst_h);

    for ty in 0..dst_h {
        let y0 = (u64::from(ty) * u64::from(src_h) / u64::from(dst_h)) as u32;
        let y1 = (((u64::from(ty) + 1) * u64::from(src_h)).div_ceil(u64::from(dst_h)) as u32)
            .clamp(y0 + 1, src_h);
        for tx in 0..dst_w {
            let x0 = (u64::from(tx) * u64::from(src_w) / u64::from(dst_w)) as u32;
            let x1 = (((u64::from(tx) + 1) * u64::from(src_w)).div_ceil(u64::from(dst_w)) as u32)
                .clamp(x0 + 1, src_w);

            let mut sums = [0u64; 4];
            for sy in y0..y1 {
                for sx in x0..x1 {
                    let p = src.get_pixel(sx, sy);
                    for (c, &v) in p.channels().iter().enumerate() {
                        sums[c] += u64::from(v);
                    }
                }
            }
            let count = u64::from(x1 - x0) * u64::from(y1 - y0);
            let out: &mut P = dst.get_pixel_mut(tx, ty);
            for (c, v) in out.channels_mut().iter_mut().enumerate().take(channels) {
                *v = ((sums[c] + count / 2) / count) as u8;
            }
        }
    }
    dst
}

/// Gaussian blur with an explicit odd kernel size, applied separably.
///
/// Sigma is derived from the kernel size with the conventional
/// `0.3 * ((k - 1) * 0.5 - 1) + 0.8` formula. Borders replicate edge
/// pixels. A kernel of 1 is a no-op copy.
pub fn gaussian_blur(src: &RgbImage, kernel_size: u32) -> RgbImage {
    let k = coerce_odd(kernel_size.max(1));
    if k == 1 {
        return src.clone();
    }
    let kernel = gaussian_kernel(k);
    let radius = (k / 2) as i64;
    let (w, h) = src.dimensions();

    // Horizontal pass into an f32 buffer, then vertical pass back to u8.
    let mut horiz = vec![0.0f32; (w * h) as usize * 3];
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 3];
            for (t, &weight) in kernel.iter().enumerate() {
                let sx = (x as i64 + t as i64 - radius).clamp(0, w as i64 - 1) as u32;
                let p = src.get_pixel(sx, y);
                for c in 0..3 {
                    acc[c] += weight * f32::from(p[c]);
                }
            }
            let idx = ((y * w + x) * 3) as usize;
            horiz[idx..idx + 3].copy_from_slice(&acc);
        }
    }

    let mut dst = RgbImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 3];
            for (t, &weight) in kernel.iter().enumerate() {
                let sy = (y as i64 + t as i64 - radius).clamp(0, h as i64 - 1) as u32;
                let idx = ((sy * w + x) * 3) as usize;
                for c in 0..3 {
                    acc[c] += weight * horiz[idx + c];
                }
            }
            let p = dst.get_pixel_mut(x, y);
            for c in 0..3 {
                p[c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    dst
}

/// Normalized 1-D Gaussian kernel of odd length `k`.
fn gaussian_kernel(k: u32) -> Vec<f32> {
    let sigma = (0.3 * ((k as f32 - 1.0) * 0.5 - 1.0) + 0.8).max(0.1);
    let radius = (k / 2) as i64;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}
