//! Veil CLI - local batch face anonymization.
//!
//! Veil detects faces in photos, redacts them with a mosaic or blur, and
//! saves the result next to your originals. Everything runs offline.
//!
//! # Usage
//!
//! ```bash
//! # Anonymize a single image
//! veil process portrait.jpg
//!
//! # Anonymize a whole folder
//! veil process ./photos/ --output ./anonymized/
//!
//! # Activate a pro license
//! veil license activate VEIL-XXXX-XXXX-XXXX-XXXX
//!
//! # View configuration
//! veil config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Veil - local batch face anonymization.
#[derive(Parser, Debug)]
#[command(name = "veil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect faces in images and redact them
    Process(cli::process::ProcessArgs),

    /// Manage the offline license key
    License(cli::license::LicenseArgs),

    /// Show detector model status and install instructions
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match veil_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `veil config path`."
            );
            veil_core::Config::default()
        }
    };
    logging::init(&config.logging, cli.verbose, cli.json_logs);

    tracing::debug!("Veil v{}", veil_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Process(args) => cli::process::execute(args, config),
        Commands::License(args) => cli::license::execute(args),
        Commands::Models(args) => cli::models::execute(args, config),
        Commands::Config(args) => cli::config::execute(args),
    }
}
