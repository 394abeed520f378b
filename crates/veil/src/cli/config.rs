//! The `veil config` command.
//!
//! Read-only: `show` prints the effective configuration (file values merged
//! over defaults), `path` prints where that file is looked up. Editing is
//! done with a text editor; there is no write surface here.

use clap::{Args, Subcommand};
use veil_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Print the config file location
    Path,
}

/// Execute the config command.
pub fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => print!("{}", Config::load()?.to_toml()?),
        ConfigCommand::Path => println!("{}", Config::default_path().display()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        command: ConfigCommand,
    }

    #[test]
    fn test_surface_is_show_and_path_only() {
        assert!(Harness::try_parse_from(["config", "show"]).is_ok());
        assert!(Harness::try_parse_from(["config", "path"]).is_ok());
        assert!(Harness::try_parse_from(["config", "init"]).is_err());
        assert!(Harness::try_parse_from(["config", "edit"]).is_err());
    }
}
