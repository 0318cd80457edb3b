//! Custom error types for the common library
//!
//! This module defines the errors raised while assembling the service
//! configuration.

use thiserror::Error;

/// Custom error type for configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A layer (defaults, file, environment) could not be read or deserialized
    #[error("Configuration load error: {0}")]
    Load(#[from] config::ConfigError),

    /// No key for the captioning model was supplied
    #[error(
        "Gemini API key is not defined. Set GEMINI_API_KEY (or KIPTON_GEMINI__API_KEY) in your environment."
    )]
    MissingApiKey,

    /// A value was present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Type alias for Result with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;
