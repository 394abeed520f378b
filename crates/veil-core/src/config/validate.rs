//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.mosaic_block_size == 0 {
            return Err(ConfigError::Validation(
                "processing.mosaic_block_size must be >= 1".into(),
            ));
        }
        if self.processing.blur_kernel_size == 0 {
            return Err(ConfigError::Validation(
                "processing.blur_kernel_size must be >= 1".into(),
            ));
        }
        if self.processing.save_quality == 0 || self.processing.save_quality > 100 {
            return Err(ConfigError::Validation(
                "processing.save_quality must be between 1 and 100".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::Validation(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.detector.confidence_threshold) {
            return Err(ConfigError::Validation(
                "detector.confidence_threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.detector.scale_factor <= 1.0 {
            return Err(ConfigError::Validation(
                "detector.scale_factor must be > 1.0".into(),
            ));
        }
        if self.detector.min_face_size == 0 {
            return Err(ConfigError::Validation(
                "detector.min_face_size must be >= 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.watermark.scale) || self.watermark.scale == 0.0 {
            return Err(ConfigError::Validation(
                "watermark.scale must be in (0.0, 1.0]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.watermark.opacity) {
            return Err(ConfigError::Validation(
                "watermark.opacity must be between 0.0 and 1.0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_block_size() {
        let mut config = Config::default();
        config.processing.mosaic_block_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mosaic_block_size"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_quality() {
        let mut config = Config::default();
        config.processing.save_quality = 0;
        assert!(config.validate().is_err());
        config.processing.save_quality = 101;
        assert!(config.validate().is_err());
        config.processing.save_quality = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_confidence() {
        let mut config = Config::default();
        config.detector.confidence_threshold = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("confidence_threshold"));
    }

    #[test]
    fn test_validate_rejects_scale_factor_at_or_below_one() {
        let mut config = Config::default();
        config.detector.scale_factor = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_opacity() {
        let mut config = Config::default();
        config.watermark.opacity = -0.1;
        assert!(config.validate().is_err());
        config.watermark.opacity = 1.1;
        assert!(config.validate().is_err());
    }
}
