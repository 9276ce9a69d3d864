//! Pipeline configuration for gtmforge.
//!
//! Configuration is loaded from environment variables with sensible defaults,
//! covering generation thresholds and retry budgets, per-call timeouts,
//! intra-stage concurrency, validation floors, and asset storage paths.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration for the pipeline orchestrator and its stages.
#[derive(Debug, Clone)]
pub struct ForgeConfig {
    // Image generation settings
    /// Minimum quality score to accept an image without retrying.
    pub image_quality_threshold: f64,
    /// Retry budget per image prompt.
    pub image_max_retries: u32,
    /// Fixed backoff delay between image retries.
    pub image_retry_delay: Duration,

    // Video generation settings
    /// Minimum quality score to accept a video without retrying.
    pub video_quality_threshold: f64,
    /// Retry budget per video prompt.
    pub video_max_retries: u32,
    /// Base delay for the video stage's exponential backoff.
    pub video_backoff_base: Duration,

    // Deck assembly settings
    /// Minimum quality score to accept a deck render without retrying.
    pub deck_quality_threshold: f64,
    /// Retry budget for deck assembly.
    pub deck_max_retries: u32,
    /// Applied design theme for deck assembly.
    pub deck_theme: String,

    // Execution settings
    /// Maximum number of per-item generation loops running concurrently
    /// within a stage.
    pub max_concurrent_generations: usize,
    /// Timeout applied to each individual backend call.
    pub backend_timeout: Duration,

    // Validation settings
    /// Retry budget per asset during integrity validation.
    pub validation_max_retries: u32,
    /// Base delay for validation's exponential backoff (`base * 2^attempt`).
    pub validation_backoff_base: Duration,
    /// Quality score floor below which a valid asset earns a warning.
    pub validation_quality_floor: f64,
    /// Minimum on-disk size in bytes for an asset to pass without a warning.
    pub validation_min_asset_bytes: u64,
    /// Minimum trailer duration in seconds before a warning is raised.
    pub validation_min_video_seconds: u32,

    // Storage settings
    /// Root directory for generated assets and manifests.
    pub output_dir: PathBuf,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            // Image defaults (matches the historical Imagen gate)
            image_quality_threshold: 0.85,
            image_max_retries: 3,
            image_retry_delay: Duration::from_secs(1),

            // Video defaults
            video_quality_threshold: 0.80,
            video_max_retries: 2,
            video_backoff_base: Duration::from_secs(2),

            // Deck defaults
            deck_quality_threshold: 0.75,
            deck_max_retries: 2,
            deck_theme: "dark_steel_tech_blue".to_string(),

            // Execution defaults
            max_concurrent_generations: 4,
            backend_timeout: Duration::from_secs(120),

            // Validation defaults
            validation_max_retries: 3,
            validation_backoff_base: Duration::from_secs(1),
            validation_quality_floor: 0.5,
            validation_min_asset_bytes: 16,
            validation_min_video_seconds: 15,

            // Storage defaults
            output_dir: PathBuf::from("./output"),
        }
    }
}

impl ForgeConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FORGE_IMAGE_QUALITY_THRESHOLD`: image accept threshold (default: 0.85)
    /// - `FORGE_IMAGE_MAX_RETRIES`: image retry budget (default: 3)
    /// - `FORGE_IMAGE_RETRY_DELAY_MS`: fixed image backoff in ms (default: 1000)
    /// - `FORGE_VIDEO_QUALITY_THRESHOLD`: video accept threshold (default: 0.80)
    /// - `FORGE_VIDEO_MAX_RETRIES`: video retry budget (default: 2)
    /// - `FORGE_VIDEO_BACKOFF_BASE_MS`: video backoff base in ms (default: 2000)
    /// - `FORGE_DECK_QUALITY_THRESHOLD`: deck accept threshold (default: 0.75)
    /// - `FORGE_DECK_MAX_RETRIES`: deck retry budget (default: 2)
    /// - `FORGE_DECK_THEME`: deck design theme (default: dark_steel_tech_blue)
    /// - `FORGE_MAX_CONCURRENT_GENERATIONS`: intra-stage worker bound (default: 4)
    /// - `FORGE_BACKEND_TIMEOUT_SECS`: per-call timeout (default: 120)
    /// - `FORGE_VALIDATION_MAX_RETRIES`: per-asset retry budget (default: 3)
    /// - `FORGE_VALIDATION_BACKOFF_BASE_MS`: validation backoff base (default: 1000)
    /// - `FORGE_VALIDATION_QUALITY_FLOOR`: warning floor for quality (default: 0.5)
    /// - `FORGE_VALIDATION_MIN_ASSET_BYTES`: warning floor for size (default: 16)
    /// - `FORGE_VALIDATION_MIN_VIDEO_SECONDS`: warning floor for duration (default: 15)
    /// - `FORGE_OUTPUT_DIR`: asset store root (default: ./output)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value or the
    /// resulting configuration fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("FORGE_IMAGE_QUALITY_THRESHOLD") {
            config.image_quality_threshold =
                parse_env_value(&val, "FORGE_IMAGE_QUALITY_THRESHOLD")?;
        }
        if let Ok(val) = std::env::var("FORGE_IMAGE_MAX_RETRIES") {
            config.image_max_retries = parse_env_value(&val, "FORGE_IMAGE_MAX_RETRIES")?;
        }
        if let Ok(val) = std::env::var("FORGE_IMAGE_RETRY_DELAY_MS") {
            let ms: u64 = parse_env_value(&val, "FORGE_IMAGE_RETRY_DELAY_MS")?;
            config.image_retry_delay = Duration::from_millis(ms);
        }

        if let Ok(val) = std::env::var("FORGE_VIDEO_QUALITY_THRESHOLD") {
            config.video_quality_threshold =
                parse_env_value(&val, "FORGE_VIDEO_QUALITY_THRESHOLD")?;
        }
        if let Ok(val) = std::env::var("FORGE_VIDEO_MAX_RETRIES") {
            config.video_max_retries = parse_env_value(&val, "FORGE_VIDEO_MAX_RETRIES")?;
        }
        if let Ok(val) = std::env::var("FORGE_VIDEO_BACKOFF_BASE_MS") {
            let ms: u64 = parse_env_value(&val, "FORGE_VIDEO_BACKOFF_BASE_MS")?;
            config.video_backoff_base = Duration::from_millis(ms);
        }

        if let Ok(val) = std::env::var("FORGE_DECK_QUALITY_THRESHOLD") {
            config.deck_quality_threshold = parse_env_value(&val, "FORGE_DECK_QUALITY_THRESHOLD")?;
        }
        if let Ok(val) = std::env::var("FORGE_DECK_MAX_RETRIES") {
            config.deck_max_retries = parse_env_value(&val, "FORGE_DECK_MAX_RETRIES")?;
        }
        if let Ok(val) = std::env::var("FORGE_DECK_THEME") {
            config.deck_theme = val;
        }

        if let Ok(val) = std::env::var("FORGE_MAX_CONCURRENT_GENERATIONS") {
            config.max_concurrent_generations =
                parse_env_value(&val, "FORGE_MAX_CONCURRENT_GENERATIONS")?;
        }
        if let Ok(val) = std::env::var("FORGE_BACKEND_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "FORGE_BACKEND_TIMEOUT_SECS")?;
            config.backend_timeout = Duration::from_secs(secs);
        }

        if let Ok(val) = std::env::var("FORGE_VALIDATION_MAX_RETRIES") {
            config.validation_max_retries = parse_env_value(&val, "FORGE_VALIDATION_MAX_RETRIES")?;
        }
        if let Ok(val) = std::env::var("FORGE_VALIDATION_BACKOFF_BASE_MS") {
            let ms: u64 = parse_env_value(&val, "FORGE_VALIDATION_BACKOFF_BASE_MS")?;
            config.validation_backoff_base = Duration::from_millis(ms);
        }
        if let Ok(val) = std::env::var("FORGE_VALIDATION_QUALITY_FLOOR") {
            config.validation_quality_floor =
                parse_env_value(&val, "FORGE_VALIDATION_QUALITY_FLOOR")?;
        }
        if let Ok(val) = std::env::var("FORGE_VALIDATION_MIN_ASSET_BYTES") {
            config.validation_min_asset_bytes =
                parse_env_value(&val, "FORGE_VALIDATION_MIN_ASSET_BYTES")?;
        }
        if let Ok(val) = std::env::var("FORGE_VALIDATION_MIN_VIDEO_SECONDS") {
            config.validation_min_video_seconds =
                parse_env_value(&val, "FORGE_VALIDATION_MIN_VIDEO_SECONDS")?;
        }

        if let Ok(val) = std::env::var("FORGE_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(val);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any threshold is outside
    /// `[0.0, 1.0]` or the concurrency bound is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("image_quality_threshold", self.image_quality_threshold),
            ("video_quality_threshold", self.video_quality_threshold),
            ("deck_quality_threshold", self.deck_quality_threshold),
            ("validation_quality_floor", self.validation_quality_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }

        if self.max_concurrent_generations == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_concurrent_generations must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parses an environment variable value into the target type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{}': {}", value, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ForgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.image_max_retries, 3);
        assert_eq!(config.video_max_retries, 2);
        assert!((config.image_quality_threshold - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = ForgeConfig::default();
        config.image_quality_threshold = 1.5;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("image_quality_threshold"));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = ForgeConfig::default();
        config.max_concurrent_generations = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_env_value() {
        let parsed: u32 = parse_env_value("7", "TEST_KEY").unwrap();
        assert_eq!(parsed, 7);

        let err = parse_env_value::<u32>("not-a-number", "TEST_KEY").unwrap_err();
        assert!(err.to_string().contains("TEST_KEY"));
    }
}
