//! Batch pipeline: file discovery and per-file orchestration.

mod discovery;
mod processor;

pub use discovery::FileDiscovery;
pub use processor::Anonymizer;
