//! The `veil license` command for offline license key management.

use clap::{Args, Subcommand};
use veil_core::LicenseManager;

/// Arguments for the `license` command.
#[derive(Args, Debug)]
pub struct LicenseArgs {
    #[command(subcommand)]
    pub command: LicenseCommand,
}

/// Subcommands for license management.
#[derive(Subcommand, Debug)]
pub enum LicenseCommand {
    /// Validate a key and store it for future runs
    Activate {
        /// License key (VEIL-XXXX-XXXX-XXXX-XXXX)
        key: String,
    },

    /// Remove any stored key and return to the free tier
    Deactivate,

    /// Show the current license tier
    Status,
}

/// Execute the license command.
pub fn execute(args: LicenseArgs) -> anyhow::Result<()> {
    let mut license = LicenseManager::new();

    match args.command {
        LicenseCommand::Activate { key } => {
            if license.activate(&key) {
                println!("License activated. Pro features are now enabled.");
            } else {
                anyhow::bail!(
                    "Invalid license key.\n\n  \
                     Keys look like VEIL-XXXX-XXXX-XXXX-XXXX. Check for typos and try again."
                );
            }
        }

        LicenseCommand::Deactivate => {
            license.deactivate();
            println!("License removed. Running on the free tier.");
        }

        LicenseCommand::Status => {
            if license.is_pro() {
                println!("Tier: pro");
                println!("Batch limit: unlimited");
                println!("Watermark: optional");
            } else {
                println!("Tier: free");
                println!("Batch limit: {} files", license.batch_limit());
                println!("Watermark: always applied");
            }
        }
    }

    Ok(())
}
