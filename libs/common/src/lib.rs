//! Common library for the Kipton captioning service
//!
//! This crate provides the pieces shared by the media and API services:
//! the caption domain model, configuration loading, and configuration
//! errors.

pub mod config;
pub mod error;
pub mod models;

pub use config::AppConfig;
pub use error::ConfigError;
pub use models::{
    Caption, CaptionLength, CaptionOptions, CaptionSet, CaptionSlot, MediaKind, Tone,
};

/// Example usage of the configuration module
///
/// ```rust,no_run
/// use common::AppConfig;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = AppConfig::load()?;
///     println!("Serving on {}", config.server.address());
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
