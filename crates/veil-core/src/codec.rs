//! Image loading and saving with metadata passthrough.
//!
//! The codec captures the raw EXIF APP1 segment at load time and splices it
//! back verbatim when saving JPEG output, so camera metadata survives the
//! pipeline untouched. Formats without embedded metadata support (PNG, BMP,
//! WebP) drop the blob silently. EXIF orientation is applied to the pixels
//! on load so detection and redaction operate on the upright image.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use crate::error::{PipelineError, PipelineResult};

/// JPEG marker constants.
const SOI: [u8; 2] = [0xFF, 0xD8];
const APP1: u8 = 0xE1;
const SOS: u8 = 0xDA;
const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// An image loaded from disk together with its opaque metadata blob.
#[derive(Debug)]
pub struct LoadedImage {
    /// Decoded pixels, orientation already applied
    pub image: RgbImage,
    /// Raw EXIF APP1 payload (including the `Exif\0\0` header), if present
    pub exif: Option<Vec<u8>>,
}

/// Load an image, capturing its EXIF blob and applying orientation.
pub fn load(path: &Path) -> PipelineResult<LoadedImage> {
    let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let reader = image::ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot detect image format: {}", e),
        })?;
    let decoded = reader.decode().map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let exif_blob = extract_app1_exif(&bytes);
    let orientation = read_orientation(&bytes);
    let image = apply_orientation(decoded.to_rgb8(), orientation);

    Ok(LoadedImage {
        image,
        exif: exif_blob,
    })
}

/// Save an image, reattaching the EXIF blob for JPEG output.
///
/// `quality` applies to JPEG encoding only; other formats use their
/// encoder defaults.
pub fn save(
    image: &RgbImage,
    path: &Path,
    quality: u8,
    exif: Option<&[u8]>,
) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::Encode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if ext == "jpg" || ext == "jpeg" {
        let mut encoded = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
        image
            .write_with_encoder(encoder)
            .map_err(|e| PipelineError::Encode {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let output = match exif {
            Some(blob) => splice_app1_exif(&encoded, blob),
            None => encoded,
        };
        std::fs::write(path, output).map_err(|e| PipelineError::Encode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    } else {
        // Non-JPEG formats carry no metadata blob
        image.save(path).map_err(|e| PipelineError::Encode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Scan a JPEG byte stream for the EXIF APP1 segment payload.
///
/// Returns `None` for non-JPEG data or JPEGs without EXIF.
pub(crate) fn extract_app1_exif(bytes: &[u8]) -> Option<Vec<u8>> {
    if bytes.len() < 4 || bytes[0..2] != SOI {
        return None;
    }
    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        // Standalone markers have no length field
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }
        if marker == SOS {
            // Entropy-coded data follows; no more headers
            return None;
        }
        let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        if len < 2 || pos + 2 + len > bytes.len() {
            return None;
        }
        let payload = &bytes[pos + 4..pos + 2 + len];
        if marker == APP1 && payload.starts_with(EXIF_HEADER) {
            return Some(payload.to_vec());
        }
        pos += 2 + len;
    }
    None
}

/// Insert an EXIF APP1 segment right after the SOI marker.
///
/// Oversized payloads (unencodable in a single segment) are dropped rather
/// than producing a corrupt file.
pub(crate) fn splice_app1_exif(jpeg: &[u8], payload: &[u8]) -> Vec<u8> {
    if jpeg.len() < 2 || jpeg[0..2] != SOI || payload.len() + 2 > u16::MAX as usize {
        return jpeg.to_vec();
    }
    let seg_len = (payload.len() + 2) as u16;
    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&SOI);
    out.push(0xFF);
    out.push(APP1);
    out.extend_from_slice(&seg_len.to_be_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Read the EXIF orientation tag (1-8), defaulting to 1 (upright).
fn read_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let Ok(exif) = exif::Reader::new().read_from_container(&mut cursor) else {
        return 1;
    };
    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Rotate/flip pixels so the image displays upright.
fn apply_orientation(image: RgbImage, orientation: u32) -> RgbImage {
    use image::imageops;
    match orientation {
        2 => imageops::flip_horizontal(&image),
        3 => imageops::rotate180(&image),
        4 => imageops::flip_vertical(&image),
        5 => imageops::flip_horizontal(&imageops::rotate90(&image)),
        6 => imageops::rotate90(&image),
        7 => imageops::flip_horizontal(&imageops::rotate270(&image)),
        8 => imageops::rotate270(&image),
        _ => image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Minimal valid EXIF payload: `Exif\0\0` + little-endian TIFF with a
    /// single IFD holding Orientation = `orientation`.
    fn exif_payload_with_orientation(orientation: u16) -> Vec<u8> {
        let mut p = EXIF_HEADER.to_vec();
        p.extend_from_slice(b"II\x2A\x00\x08\x00\x00\x00"); // TIFF header, IFD at 8
        p.extend_from_slice(&1u16.to_le_bytes()); // one entry
        p.extend_from_slice(&0x0112u16.to_le_bytes()); // Orientation tag
        p.extend_from_slice(&3u16.to_le_bytes()); // SHORT
        p.extend_from_slice(&1u32.to_le_bytes()); // count
        p.extend_from_slice(&orientation.to_le_bytes());
        p.extend_from_slice(&0u16.to_le_bytes()); // value padding
        p.extend_from_slice(&0u32.to_le_bytes()); // no next IFD
        p
    }

    fn gradient(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_extract_app1_from_spliced_jpeg() {
        let img = gradient(16, 16);
        let mut encoded = Vec::new();
        img.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, 90))
            .unwrap();

        let payload = exif_payload_with_orientation(1);
        let spliced = splice_app1_exif(&encoded, &payload);
        assert_eq!(extract_app1_exif(&spliced).as_deref(), Some(&payload[..]));
    }

    #[test]
    fn test_extract_returns_none_without_exif() {
        let img = gradient(8, 8);
        let mut encoded = Vec::new();
        img.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, 90))
            .unwrap();
        assert!(extract_app1_exif(&encoded).is_none());
        assert!(extract_app1_exif(b"not a jpeg").is_none());
    }

    #[test]
    fn test_save_and_load_preserves_blob_for_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let payload = exif_payload_with_orientation(1);

        save(&gradient(32, 24), &path, 95, Some(&payload)).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.exif.as_deref(), Some(&payload[..]));
        assert_eq!(loaded.image.dimensions(), (32, 24));
    }

    #[test]
    fn test_png_save_drops_blob_silently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let payload = exif_payload_with_orientation(1);

        save(&gradient(10, 10), &path, 95, Some(&payload)).unwrap();
        let loaded = load(&path).unwrap();
        assert!(loaded.exif.is_none());
        assert_eq!(loaded.image.dimensions(), (10, 10));
    }

    #[test]
    fn test_orientation_applied_on_load() {
        // Orientation 6 (rotate 90° CW) swaps the displayed dimensions.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rotated.jpg");
        let payload = exif_payload_with_orientation(6);

        save(&gradient(40, 20), &path, 95, Some(&payload)).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.image.dimensions(), (20, 40));
    }

    #[test]
    fn test_load_missing_file_is_decode_error() {
        let err = load(Path::new("/nonexistent/image.jpg")).unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[test]
    fn test_apply_orientation_dimension_swaps() {
        let img = gradient(30, 10);
        for o in [5, 6, 7, 8] {
            assert_eq!(apply_orientation(img.clone(), o).dimensions(), (10, 30));
        }
        for o in [1, 2, 3, 4] {
            assert_eq!(apply_orientation(img.clone(), o).dimensions(), (30, 10));
        }
    }
}
