//! Veil Core - local batch face anonymization.
//!
//! Veil detects faces in photos, redacts them with a mosaic or blur,
//! optionally composites a logo watermark, and saves the result with the
//! original metadata preserved. Everything runs offline on the local
//! machine; nothing ever leaves it.
//!
//! # Architecture
//!
//! ```text
//! Folder → Scan → (per file) Load → Detect → Redact → Watermark → Save
//!                                                            ↘ statistics
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use veil_core::{Anonymizer, Config};
//!
//! fn main() -> veil_core::Result<()> {
//!     let config = Config::load()?;
//!     let anonymizer = Anonymizer::new(config)?;
//!
//!     let stats = anonymizer.process_folder("./photos".as_ref(), "./output".as_ref(), false)?;
//!     println!("Processed {} images, {} faces", stats.success, stats.faces_detected);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod codec;
pub mod config;
pub mod detect;
pub mod error;
pub mod license;
pub mod pipeline;
pub mod redact;
pub mod types;
pub mod watermark;

// Re-exports for convenient access
pub use config::Config;
pub use detect::{build_detector, DetectorKind, FaceDetector};
pub use error::{ConfigError, PipelineError, PipelineResult, Result, VeilError};
pub use license::LicenseManager;
pub use pipeline::Anonymizer;
pub use redact::RedactionMethod;
pub use types::{BatchStats, BoundingBox};
pub use watermark::Placement;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
