//! Configuration module for the captioning service
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional `kipton.{toml,yaml,json}` file in the working directory, then
//! `KIPTON_`-prefixed environment variables (sections separated by `__`).

use crate::error::{ConfigError, ConfigResult};
use config::{Config, Environment, File, builder::DefaultState};
use serde::Deserialize;
use std::env;
use tracing::info;

/// Top-level service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub frames: FrameConfig,
    pub upload: UploadConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Socket address string for the listener
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Captioning model settings
#[derive(Clone, Deserialize)]
pub struct GeminiConfig {
    /// API key sent in the `x-goog-api-key` header
    #[serde(default)]
    pub api_key: String,
    /// Model name, e.g. `gemini-2.5-flash`
    pub model: String,
    /// Base URL of the Generative Language API
    pub base_url: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

// Keeps the key out of logs.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish_non_exhaustive()
    }
}

/// Still-frame extraction settings
#[derive(Debug, Clone, Deserialize)]
pub struct FrameConfig {
    /// Path or name of the `ffmpeg` executable
    pub ffmpeg_path: String,
    /// Path or name of the `ffprobe` executable
    pub ffprobe_path: String,
    /// Preferred seek offset into the video, in seconds
    pub seek_seconds: f64,
}

/// Upload boundary settings
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum request body size for uploads, in bytes
    pub max_bytes: usize,
}

impl AppConfig {
    /// Load the configuration from all layers
    ///
    /// # Environment Variables
    /// - `KIPTON_SERVER__HOST`, `KIPTON_SERVER__PORT`: listener (default: 127.0.0.1:8080)
    /// - `KIPTON_GEMINI__MODEL`: model name (default: gemini-2.5-flash)
    /// - `KIPTON_GEMINI__API_KEY`, `GEMINI_API_KEY` or `API_KEY`: model API key (required)
    /// - `KIPTON_FRAMES__FFMPEG_PATH`, `KIPTON_FRAMES__FFPROBE_PATH`: tool locations
    /// - `KIPTON_UPLOAD__MAX_BYTES`: upload body limit (default: 256 MiB)
    pub fn load() -> ConfigResult<Self> {
        let fallback_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok();

        let settings = Self::defaults()?
            .add_source(File::with_name("kipton").required(false))
            .add_source(Self::environment())
            .build()?;

        let mut config: AppConfig = settings.try_deserialize()?;
        if config.gemini.api_key.is_empty() {
            config.gemini.api_key = fallback_key.unwrap_or_default();
        }

        config.validate()?;
        info!(
            "Configuration loaded: listening on {}, model {}",
            config.server.address(),
            config.gemini.model
        );
        Ok(config)
    }

    /// Builder pre-populated with the built-in defaults
    pub fn defaults() -> ConfigResult<config::ConfigBuilder<DefaultState>> {
        let builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("gemini.api_key", "")?
            .set_default("gemini.model", "gemini-2.5-flash")?
            .set_default(
                "gemini.base_url",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("gemini.temperature", 0.8)?
            .set_default("gemini.request_timeout_secs", 60)?
            .set_default("frames.ffmpeg_path", "ffmpeg")?
            .set_default("frames.ffprobe_path", "ffprobe")?
            .set_default("frames.seek_seconds", 1.0)?
            .set_default("upload.max_bytes", 256 * 1024 * 1024)?;

        Ok(builder)
    }

    /// Environment layer: `KIPTON_<SECTION>__<KEY>`
    pub fn environment() -> Environment {
        Environment::with_prefix("KIPTON")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.gemini.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if !(0.0..=2.0).contains(&self.gemini.temperature) {
            return Err(ConfigError::Invalid(format!(
                "gemini.temperature must be within 0.0..=2.0, got {}",
                self.gemini.temperature
            )));
        }
        if !self.frames.seek_seconds.is_finite() || self.frames.seek_seconds < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "frames.seek_seconds must be a non-negative number, got {}",
                self.frames.seek_seconds
            )));
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Invalid(
                "upload.max_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_with_env(vars: &[(&str, &str)]) -> ConfigResult<AppConfig> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let config: AppConfig = AppConfig::defaults()?
            .add_source(AppConfig::environment().source(Some(env)))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_defaults_require_api_key() {
        let result = load_with_env(&[]);
        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let config = load_with_env(&[
            ("KIPTON_GEMINI__API_KEY", "secret"),
            ("KIPTON_SERVER__PORT", "9090"),
            ("KIPTON_GEMINI__MODEL", "gemini-2.0-flash"),
        ])
        .expect("config should load");

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.address(), "127.0.0.1:9090");
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.gemini.api_key, "secret");
        assert_eq!(config.frames.seek_seconds, 1.0);
        assert_eq!(config.upload.max_bytes, 256 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_temperature_rejected() {
        let result = load_with_env(&[
            ("KIPTON_GEMINI__API_KEY", "secret"),
            ("KIPTON_GEMINI__TEMPERATURE", "3.5"),
        ]);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = load_with_env(&[("KIPTON_GEMINI__API_KEY", "very-secret")]).unwrap();
        let rendered = format!("{:?}", config.gemini);
        assert!(!rendered.contains("very-secret"));
    }
}
