//! Configuration management for Veil.
//!
//! Configuration is loaded from the platform config directory (e.g.
//! `~/.config/veil/config.toml` on Linux) with sensible defaults. All config
//! structs implement `Default`; invalid values are rejected at load time,
//! never deep inside processing.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Veil.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Per-file processing settings
    pub processing: ProcessingConfig,

    /// Face detector tuning
    pub detector: DetectorConfig,

    /// Watermark / logo settings
    pub watermark: WatermarkConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories, falling back to
    /// `~/.veil/config.toml` if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "veil", "veil")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".veil").join("config.toml")
            })
    }

    /// Get the resolved model directory path (with ~ expansion).
    pub fn model_dir(&self) -> PathBuf {
        let path_str = self.general.model_dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Validation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::DetectorKind;
    use crate::redact::RedactionMethod;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.processing.detector, DetectorKind::Ssd);
        assert_eq!(config.processing.method, RedactionMethod::Mosaic);
        assert_eq!(config.processing.save_quality, 95);
        assert_eq!(config.processing.mosaic_block_size, 10);
        assert_eq!(config.processing.blur_kernel_size, 51);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[processing]"));
        assert!(toml.contains("[watermark]"));
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = Config::default();
        let parsed: Config = toml::from_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.detector.confidence_threshold, 0.5);
        assert_eq!(parsed.watermark.scale, 0.2);
    }

    #[test]
    fn test_load_from_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[processing]\nmethod = \"blur\"\nsave_quality = 80\n",
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.processing.method, RedactionMethod::Blur);
        assert_eq!(config.processing.save_quality, 80);
        // Untouched sections keep defaults
        assert_eq!(config.detector.min_neighbors, 5);
    }
}
