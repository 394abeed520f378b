//! The `veil models` command for checking detector model files.
//!
//! Veil never downloads anything itself. This command reports which model
//! files are present and where to put the missing ones.

use clap::Args;
use veil_core::detect::{SeetaDetector, SsdDetector};
use veil_core::Config;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Only print the model directory path
    #[arg(long)]
    pub path: bool,
}

/// One detector backend and the files it needs on disk.
struct ModelEntry {
    detector: &'static str,
    files: &'static [&'static str],
    source: &'static str,
}

const MODEL_ENTRIES: &[ModelEntry] = &[
    ModelEntry {
        detector: "ssd",
        files: &[SsdDetector::MODEL_FILE, SsdDetector::WEIGHTS_FILE],
        source: "Export the ResNet-10 SSD face model to ONNX with external weights",
    },
    ModelEntry {
        detector: "seeta",
        files: &[SeetaDetector::MODEL_FILE],
        source: "https://github.com/atomashpolskiy/rustface (model/ directory)",
    },
];

/// Execute the models command.
pub fn execute(args: ModelsArgs, config: Config) -> anyhow::Result<()> {
    let model_dir = config.model_dir();

    if args.path {
        println!("{}", model_dir.display());
        return Ok(());
    }

    println!("Model directory: {}", model_dir.display());
    println!();

    let mut missing = false;
    for entry in MODEL_ENTRIES {
        println!("Detector `{}`:", entry.detector);
        for file in entry.files {
            let status = if model_dir.join(file).exists() {
                "installed"
            } else {
                missing = true;
                "missing"
            };
            println!("  {:<28} {}", file, status);
        }
        println!("  Source: {}", entry.source);
        println!();
    }

    if missing {
        println!(
            "Place missing files in the model directory above, or point \
             `model_dir` in the config somewhere else (`veil config show`)."
        );
    } else {
        println!("All detector models are installed.");
    }

    Ok(())
}
