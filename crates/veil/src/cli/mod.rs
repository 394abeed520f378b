//! Command-line interface modules.

pub mod config;
pub mod license;
pub mod models;
pub mod process;
