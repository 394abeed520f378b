//! Logging initialization.
//!
//! Veil logs through the `tracing` ecosystem. The subscriber is built from
//! the `[logging]` config section with the CLI flags layered on top, and
//! writes to stderr so stdout stays reserved for command output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use veil_core::config::LoggingConfig;

/// Level directive for the filter: `--verbose` forces debug, otherwise the
/// configured level is used as-is. `RUST_LOG` overrides both at runtime.
fn level_directive(config: &LoggingConfig, verbose: bool) -> &str {
    if verbose {
        "debug"
    } else {
        config.level.as_str()
    }
}

/// JSON output is selected by `--json-logs` or `format = "json"`.
fn want_json(config: &LoggingConfig, json_logs: bool) -> bool {
    json_logs || config.format == "json"
}

/// Bring up the global subscriber. Call once, before any command runs.
pub fn init(config: &LoggingConfig, verbose: bool, json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(config, verbose)));

    let registry = tracing_subscriber::registry().with(filter);
    if want_json(config, json_logs) {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
