//! Batch orchestration - wires detection, redaction, watermarking and the
//! codec together over a directory of images.

use std::path::Path;
use std::time::Instant;

use image::RgbImage;

use crate::codec;
use crate::config::Config;
use crate::detect::{build_detector, FaceDetector};
use crate::error::{PipelineResult, Result};
use crate::license::LicenseManager;
use crate::redact::redact_faces;
use crate::types::BatchStats;
use crate::watermark::{add_logo, Logo};

use super::discovery::FileDiscovery;

/// The main processor: construct once per run, then feed it files or a
/// whole folder.
///
/// The detector model is the only long-lived shared resource; it is loaded
/// at construction and reused for every file in a batch.
pub struct Anonymizer {
    config: Config,
    detector: Box<dyn FaceDetector>,
    license: LicenseManager,
    discovery: FileDiscovery,
}

impl Anonymizer {
    /// Create a processor from configuration.
    ///
    /// Fatal configuration problems (invalid values, unknown detector kind,
    /// missing model files) surface here, before any file is touched.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let detector = build_detector(
            config.processing.detector,
            &config.detector,
            &config.model_dir(),
        )?;
        Ok(Self::assemble(config, detector, LicenseManager::new()))
    }

    /// Create a processor with an explicit detector backend and license
    /// state. This is the seam for custom detectors and for tests.
    pub fn with_parts(
        config: Config,
        detector: Box<dyn FaceDetector>,
        license: LicenseManager,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, detector, license))
    }

    fn assemble(config: Config, detector: Box<dyn FaceDetector>, license: LicenseManager) -> Self {
        let discovery = FileDiscovery::new(&config.processing);
        Self {
            config,
            detector,
            license,
            discovery,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn license(&self) -> &LicenseManager {
        &self.license
    }

    /// Process a single image: load, detect, redact, watermark, save.
    ///
    /// Returns the number of faces detected. An image with zero faces is
    /// still saved (and watermarked if applicable), just unmodified by
    /// redaction.
    pub fn process_image(&self, input: &Path, output: &Path) -> PipelineResult<usize> {
        let start = Instant::now();
        let loaded = codec::load(input)?;

        let faces = self.detector.detect(&loaded.image)?;
        tracing::debug!("Detected {} face(s) in {:?}", faces.len(), input);

        let mut image = if faces.is_empty() {
            loaded.image
        } else {
            redact_faces(
                &loaded.image,
                &faces,
                self.config.processing.method,
                &self.config.processing,
            )
        };

        self.apply_watermark(&mut image);

        codec::save(
            &image,
            output,
            self.config.processing.save_quality,
            loaded.exif.as_deref(),
        )?;

        tracing::debug!("Processed {:?} in {:?}", input, start.elapsed());
        Ok(faces.len())
    }

    /// Composite the configured logo, or the forced free-tier badge.
    ///
    /// A watermark failure downgrades to a warning: it never fails the
    /// file. The free tier always ends up with some watermark applied.
    fn apply_watermark(&self, image: &mut RgbImage) {
        let wm = &self.config.watermark;
        let forced = self.license.watermark_enabled();

        let logo = match &wm.logo_path {
            Some(path) => match Logo::load(path) {
                Ok(logo) => Some(logo),
                Err(e) if forced => {
                    tracing::warn!("{}; falling back to the built-in badge", e);
                    Some(Logo::default_badge())
                }
                Err(e) => {
                    tracing::warn!("Skipping watermark: {}", e);
                    None
                }
            },
            None if forced => Some(Logo::default_badge()),
            None => None,
        };

        if let Some(logo) = logo {
            add_logo(image, &logo, wm.position, wm.scale, wm.margin, wm.opacity);
        }
    }

    /// Process every supported image under `input_dir` into `output_dir`.
    ///
    /// Scanning failures are fatal; per-file failures are logged, counted,
    /// and never abort the batch. Returns fresh statistics for this run.
    pub fn process_folder(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        recursive: bool,
    ) -> Result<BatchStats> {
        self.process_folder_with(input_dir, output_dir, recursive, |_| {})
    }

    /// Like [`process_folder`](Self::process_folder), invoking `observe`
    /// after each file so callers can drive progress reporting.
    pub fn process_folder_with<F>(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        recursive: bool,
        mut observe: F,
    ) -> Result<BatchStats>
    where
        F: FnMut(&Path),
    {
        let start = Instant::now();
        let mut files = self.discovery.scan(input_dir, recursive)?;

        // License cap: keep the first N files in sorted order.
        let limit = self.license.batch_limit();
        if limit > 0 && files.len() > limit {
            tracing::warn!(
                "Free tier processes at most {} files per batch; skipping {} remaining files",
                limit,
                files.len() - limit
            );
            files.truncate(limit);
        }

        std::fs::create_dir_all(output_dir)?;

        let mut stats = BatchStats {
            total: files.len(),
            ..Default::default()
        };

        if files.is_empty() {
            tracing::warn!("No images to process in {:?}", input_dir);
            return Ok(stats);
        }

        tracing::info!("Processing {} image(s) from {:?}", stats.total, input_dir);

        for file in &files {
            // Mirror the relative subpath when recursing
            let output = match file.strip_prefix(input_dir) {
                Ok(rel) if recursive => output_dir.join(rel),
                _ => output_dir.join(file.file_name().unwrap_or_default()),
            };

            match self.process_image(file, &output) {
                Ok(face_count) => {
                    stats.success += 1;
                    stats.faces_detected += face_count;
                    if face_count == 0 {
                        stats.skipped_no_face += 1;
                    }
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!("Failed to process {:?}: {}", file, e);
                }
            }
            observe(file);
        }

        stats.elapsed_secs = start.elapsed().as_secs_f64();
        report(&stats);
        Ok(stats)
    }
}

/// Log the end-of-batch report.
fn report(stats: &BatchStats) {
    tracing::info!("Batch complete");
    tracing::info!("  total:      {}", stats.total);
    tracing::info!("  success:    {}", stats.success);
    tracing::info!("  failed:     {}", stats.failed);
    tracing::info!("  no faces:   {}", stats.skipped_no_face);
    tracing::info!("  faces:      {}", stats.faces_detected);
    tracing::info!("  elapsed:    {:.2}s", stats.elapsed_secs);
    if stats.total > 0 {
        tracing::info!(
            "  per image:  {:.2}s",
            stats.elapsed_secs / stats.total as f64
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::types::BoundingBox;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Detector returning a fixed set of boxes for every image.
    #[derive(Debug)]
    struct StubDetector {
        boxes: Vec<BoundingBox>,
    }

    impl FaceDetector for StubDetector {
        fn detect(&self, _image: &RgbImage) -> PipelineResult<Vec<BoundingBox>> {
            Ok(self.boxes.clone())
        }
    }

    /// Detector that always fails, for failure-isolation tests.
    #[derive(Debug)]
    struct BrokenDetector;

    impl FaceDetector for BrokenDetector {
        fn detect(&self, _image: &RgbImage) -> PipelineResult<Vec<BoundingBox>> {
            Err(PipelineError::Detect {
                message: "model exploded".to_string(),
            })
        }
    }

    fn free_license(dir: &Path) -> LicenseManager {
        LicenseManager::with_search_paths(vec![dir.join("key")])
    }

    fn pro_license(dir: &Path) -> LicenseManager {
        // The checksum covers the concatenated prefix + payload groups.
        let key = format!(
            "VEIL-AAAA-BBBB-CCCC-{}",
            LicenseManager::checksum("VEILAAAABBBBCCCC")
        );
        let mut license = LicenseManager::with_search_paths(vec![dir.join("key")]);
        assert!(license.activate(&key));
        license
    }

    fn anonymizer(boxes: Vec<BoundingBox>, license: LicenseManager) -> Anonymizer {
        Anonymizer::with_parts(Config::default(), Box::new(StubDetector { boxes }), license)
            .unwrap()
    }

    fn write_png(path: &Path) {
        let img = RgbImage::from_pixel(64, 64, image::Rgb([120, 130, 140]));
        img.save(path).unwrap();
    }

    fn seed_folder(dir: &Path, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("img_{i:02}.png"));
                write_png(&path);
                path
            })
            .collect()
    }

    #[test]
    fn test_empty_folder_yields_zeroed_stats() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        std::fs::create_dir(&input).unwrap();

        let proc = anonymizer(vec![], free_license(tmp.path()));
        let stats = proc
            .process_folder(&input, &tmp.path().join("out"), false)
            .unwrap();

        assert_eq!(stats.total, 0);
        assert_eq!(stats.success, 0);
        assert_eq!(stats.failed, 0);
    }

    #[test]
    fn test_missing_input_dir_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let proc = anonymizer(vec![], free_license(tmp.path()));

        let result = proc.process_folder(
            &tmp.path().join("nope"),
            &tmp.path().join("out"),
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_corrupt_file_does_not_abort_batch() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        std::fs::create_dir(&input).unwrap();
        seed_folder(&input, 3);
        std::fs::write(input.join("broken.jpg"), b"not an image at all").unwrap();

        let boxes = vec![BoundingBox::new(10, 10, 20, 20)];
        let proc = anonymizer(boxes, free_license(tmp.path()));
        let output = tmp.path().join("out");
        let stats = proc.process_folder(&input, &output, false).unwrap();

        assert_eq!(stats.total, 4);
        assert_eq!(stats.success, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.faces_detected, 3);
        assert!(output.join("img_00.png").exists());
        assert!(!output.join("broken.jpg").exists());
    }

    #[test]
    fn test_detector_failure_counts_as_failed() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        std::fs::create_dir(&input).unwrap();
        seed_folder(&input, 2);

        let proc = Anonymizer::with_parts(
            Config::default(),
            Box::new(BrokenDetector),
            free_license(tmp.path()),
        )
        .unwrap();
        let stats = proc
            .process_folder(&input, &tmp.path().join("out"), false)
            .unwrap();

        assert_eq!(stats.failed, 2);
        assert_eq!(stats.success, 0);
    }

    #[test]
    fn test_no_faces_counts_as_skipped_but_saves() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        std::fs::create_dir(&input).unwrap();
        seed_folder(&input, 2);

        let proc = anonymizer(vec![], free_license(tmp.path()));
        let output = tmp.path().join("out");
        let stats = proc.process_folder(&input, &output, false).unwrap();

        assert_eq!(stats.success, 2);
        assert_eq!(stats.skipped_no_face, 2);
        assert_eq!(stats.faces_detected, 0);
        assert!(output.join("img_01.png").exists());
    }

    #[test]
    fn test_free_tier_truncates_batch() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        std::fs::create_dir(&input).unwrap();
        seed_folder(&input, 7);

        let proc = anonymizer(vec![], free_license(tmp.path()));
        let stats = proc
            .process_folder(&input, &tmp.path().join("out"), false)
            .unwrap();

        // Sorted order means the first five files by name survive the cap.
        assert_eq!(stats.total, 5);
        assert_eq!(stats.success, 5);
    }

    #[test]
    fn test_pro_tier_is_unlimited() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        std::fs::create_dir(&input).unwrap();
        seed_folder(&input, 7);

        let proc = anonymizer(vec![], pro_license(tmp.path()));
        let stats = proc
            .process_folder(&input, &tmp.path().join("out"), false)
            .unwrap();

        assert_eq!(stats.total, 7);
        assert_eq!(stats.success, 7);
    }

    #[test]
    fn test_recursive_mirrors_subdirectories() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let nested = input.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        write_png(&input.join("top.png"));
        write_png(&nested.join("deep.png"));

        let proc = anonymizer(vec![], pro_license(tmp.path()));
        let output = tmp.path().join("out");
        let stats = proc.process_folder(&input, &output, true).unwrap();

        assert_eq!(stats.success, 2);
        assert!(output.join("top.png").exists());
        assert!(output.join("a").join("b").join("deep.png").exists());
    }

    #[test]
    fn test_free_tier_forces_watermark() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("plain.png");
        write_png(&input);

        let proc = anonymizer(vec![], free_license(tmp.path()));
        let output = tmp.path().join("out.png");
        proc.process_image(&input, &output).unwrap();

        // On a 64x64 source the badge scales to 12x4 and is anchored 20px
        // from the bottom-right corner, covering x in [32,44) and y in [40,44).
        let saved = image::open(&output).unwrap().to_rgb8();
        let inside = *saved.get_pixel(38, 42);
        assert_ne!(inside, image::Rgb([120, 130, 140]));
    }

    #[test]
    fn test_pro_tier_without_logo_leaves_image_untouched() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("plain.png");
        write_png(&input);

        let proc = anonymizer(vec![], pro_license(tmp.path()));
        let output = tmp.path().join("out.png");
        let faces = proc.process_image(&input, &output).unwrap();

        assert_eq!(faces, 0);
        let saved = image::open(&output).unwrap().to_rgb8();
        assert!(saved.pixels().all(|p| *p == image::Rgb([120, 130, 140])));
    }

    #[test]
    fn test_process_image_redacts_faces() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("face.png");
        // A gradient so the mosaic visibly changes the region
        let img = RgbImage::from_fn(64, 64, |x, y| image::Rgb([(x * 4) as u8, (y * 4) as u8, 0]));
        img.save(&input).unwrap();

        let boxes = vec![BoundingBox::new(8, 8, 32, 32)];
        let proc = anonymizer(boxes, pro_license(tmp.path()));
        let output = tmp.path().join("out.png");
        let faces = proc.process_image(&input, &output).unwrap();

        assert_eq!(faces, 1);
        let saved = image::open(&output).unwrap().to_rgb8();
        assert_ne!(
            saved.get_pixel(20, 20),
            img.get_pixel(20, 20),
            "redacted region should differ from the source"
        );
        assert_eq!(
            saved.get_pixel(60, 4),
            img.get_pixel(60, 4),
            "pixels outside the face must be untouched"
        );
    }
}

