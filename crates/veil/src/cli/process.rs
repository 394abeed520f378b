//! The `veil process` command for anonymizing images.

use clap::Args;
use std::path::{Path, PathBuf};
use veil_core::types::BatchStats;
use veil_core::{Anonymizer, Config, DetectorKind, Placement, RedactionMethod};

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Image file or directory to process
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file or directory (defaults to `<input>_anonymized`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Face detector backend (seeta or ssd)
    #[arg(long, value_parser = clap::value_parser!(DetectorKind))]
    pub detector: Option<DetectorKind>,

    /// Redaction method (mosaic or blur)
    #[arg(short, long, value_parser = clap::value_parser!(RedactionMethod))]
    pub method: Option<RedactionMethod>,

    /// Mosaic block size in pixels
    #[arg(long)]
    pub mosaic_size: Option<u32>,

    /// Gaussian blur kernel size (coerced to odd)
    #[arg(long)]
    pub blur_kernel: Option<u32>,

    /// Minimum detection confidence (0.0 - 1.0, SSD only)
    #[arg(long)]
    pub confidence: Option<f32>,

    /// JPEG save quality (1-100)
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// Logo image to composite as a watermark
    #[arg(long)]
    pub logo: Option<PathBuf>,

    /// Logo size as a fraction of the output image (0.0 - 1.0)
    #[arg(long)]
    pub logo_scale: Option<f32>,

    /// Logo margin from the anchored corner in pixels
    #[arg(long)]
    pub logo_margin: Option<u32>,

    /// Logo opacity (0.0 - 1.0)
    #[arg(long)]
    pub logo_opacity: Option<f32>,

    /// Corner to anchor the logo to
    #[arg(long, value_parser = clap::value_parser!(Placement))]
    pub position: Option<Placement>,

    /// Write batch statistics as JSON to this file
    #[arg(long)]
    pub stats_json: Option<PathBuf>,
}

/// Execute the process command.
pub fn execute(args: ProcessArgs, mut config: Config) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }

    apply_overrides(&args, &mut config);

    let anonymizer = Anonymizer::new(config)?;

    if args.input.is_file() {
        process_single(&anonymizer, &args)
    } else {
        process_batch(&anonymizer, &args)
    }
}

/// Fold CLI flags over the loaded configuration.
fn apply_overrides(args: &ProcessArgs, config: &mut Config) {
    if let Some(detector) = args.detector {
        config.processing.detector = detector;
    }
    if let Some(method) = args.method {
        config.processing.method = method;
    }
    if let Some(size) = args.mosaic_size {
        config.processing.mosaic_block_size = size;
    }
    if let Some(kernel) = args.blur_kernel {
        config.processing.blur_kernel_size = kernel;
    }
    if let Some(quality) = args.quality {
        config.processing.save_quality = quality;
    }
    if let Some(confidence) = args.confidence {
        config.detector.confidence_threshold = confidence;
    }
    if let Some(ref logo) = args.logo {
        config.watermark.logo_path = Some(logo.clone());
    }
    if let Some(scale) = args.logo_scale {
        config.watermark.scale = scale;
    }
    if let Some(margin) = args.logo_margin {
        config.watermark.margin = margin;
    }
    if let Some(opacity) = args.logo_opacity {
        config.watermark.opacity = opacity;
    }
    if let Some(position) = args.position {
        config.watermark.position = position;
    }
}

/// Default output path when `--output` is omitted.
fn default_output(input: &Path) -> PathBuf {
    if input.is_file() {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let ext = input
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "jpg".to_string());
        input.with_file_name(format!("{stem}_anonymized.{ext}"))
    } else {
        let name = input
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        input.with_file_name(format!("{name}_anonymized"))
    }
}

// ── Single-file processing ─────────────────────────────────────────────────

fn process_single(anonymizer: &Anonymizer, args: &ProcessArgs) -> anyhow::Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input));

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let faces = anonymizer.process_image(&args.input, &output)?;

    if faces == 0 {
        tracing::warn!("No faces detected in {:?}", args.input);
    }
    println!("{} face(s) redacted -> {}", faces, output.display());
    Ok(())
}

// ── Batch processing ───────────────────────────────────────────────────────

fn process_batch(anonymizer: &Anonymizer, args: &ProcessArgs) -> anyhow::Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input));

    if !anonymizer.license().is_pro() {
        tracing::info!(
            "Running on the free tier (max {} files per batch, watermark applied). \
             Activate a key with `veil license activate`.",
            anonymizer.license().batch_limit()
        );
    }

    // The batch size is only known after scanning, so use a spinner with
    // a running count instead of a fixed-length bar.
    let progress = create_progress_bar();
    let stats = anonymizer.process_folder_with(&args.input, &output, args.recursive, |path| {
        progress.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        progress.inc(1);
    })?;
    progress.finish_and_clear();

    print_summary(&stats, &output);

    if let Some(ref path) = args.stats_json {
        std::fs::write(path, serde_json::to_string_pretty(&stats)?)?;
        tracing::info!("Statistics written to {:?}", path);
    }

    if stats.failed > 0 {
        anyhow::bail!("{} file(s) failed to process", stats.failed);
    }
    Ok(())
}

/// Create a progress bar for batch processing.
fn create_progress_bar() -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} processed {msg}")
            .unwrap(),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after batch processing.
fn print_summary(stats: &BatchStats, output: &Path) {
    let rate = if stats.elapsed_secs > 0.0 {
        stats.success as f64 / stats.elapsed_secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Processed:    {:>8}", stats.success);
    if stats.failed > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed);
    }
    if stats.skipped_no_face > 0 {
        eprintln!("    No faces:     {:>8}", stats.skipped_no_face);
    }
    eprintln!("    Faces:        {:>8}", stats.faces_detected);
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", stats.total);
    eprintln!("    Duration:     {:>7.1}s", stats.elapsed_secs);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
    eprintln!("  Output: {}", output.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ProcessArgs,
    }

    fn parse(argv: &[&str]) -> ProcessArgs {
        Harness::try_parse_from(std::iter::once("veil").chain(argv.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_flags_fold_over_config() {
        let mut config = Config::default();
        let args = parse(&[
            "photos",
            "--detector",
            "seeta",
            "--method",
            "blur",
            "--quality",
            "80",
            "--confidence",
            "0.7",
            "--logo-margin",
            "5",
            "--position",
            "top-left",
        ]);
        apply_overrides(&args, &mut config);

        assert_eq!(config.processing.detector, DetectorKind::Seeta);
        assert_eq!(config.processing.method, RedactionMethod::Blur);
        assert_eq!(config.processing.save_quality, 80);
        assert_eq!(config.detector.confidence_threshold, 0.7);
        assert_eq!(config.watermark.margin, 5);
        assert_eq!(config.watermark.position, Placement::TopLeft);
    }

    #[test]
    fn test_no_flags_leave_config_untouched() {
        let mut config = Config::default();
        apply_overrides(&parse(&["photos"]), &mut config);
        assert_eq!(
            config.to_toml().unwrap(),
            Config::default().to_toml().unwrap()
        );
    }

    #[test]
    fn test_unknown_enum_values_rejected_at_parse() {
        assert!(Harness::try_parse_from(["veil", "photos", "--method", "pixelate"]).is_err());
        assert!(Harness::try_parse_from(["veil", "photos", "--detector", "yolo"]).is_err());
        assert!(Harness::try_parse_from(["veil", "photos", "--position", "center"]).is_err());
    }

    #[test]
    fn test_default_output_for_directory() {
        assert_eq!(
            default_output(Path::new("/data/shoot")),
            PathBuf::from("/data/shoot_anonymized")
        );
    }

    #[test]
    fn test_default_output_for_file_keeps_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("portrait.jpg");
        std::fs::write(&input, b"x").unwrap();
        assert_eq!(
            default_output(&input),
            dir.path().join("portrait_anonymized.jpg")
        );
    }
}
