//! Configuration management for the `EcoRoute` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::EcoRouteError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `EcoRoute` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EcoRouteConfig {
    /// Directions and geocoding provider settings
    #[serde(default)]
    pub directions: DirectionsConfig,
    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Route scoring model settings
    #[serde(default)]
    pub model: ModelConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Default application settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Directions (Google Maps) API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionsConfig {
    /// API key, falls back to `GOOGLE_MAPS_API_KEY`
    pub api_key: Option<String>,
    #[serde(default = "default_directions_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Weather (OpenWeatherMap) API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// API key, falls back to `OPENWEATHER_API_KEY`
    pub api_key: Option<String>,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether directions responses are cached at all
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP endpoint for trace export; traces stay local when unset
    pub otlp_endpoint: Option<String>,
}

/// Feed-forward route scoring model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of synthetic training samples
    #[serde(default = "default_model_samples")]
    pub samples: usize,
    #[serde(default = "default_model_epochs")]
    pub epochs: usize,
    #[serde(default = "default_model_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_model_learning_rate")]
    pub learning_rate: f64,
    /// Fraction of samples held out for validation
    #[serde(default = "default_model_validation_split")]
    pub validation_split: f64,
    /// RNG seed for weight init, synthetic data and shuffling
    #[serde(default = "default_model_seed")]
    pub seed: u64,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Directory with the static map front-end
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// Default application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Vehicle type used when none is given
    #[serde(default = "default_vehicle")]
    pub vehicle: String,
    /// Map centre used when the user position is unknown
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,
    #[serde(default = "default_center_lng")]
    pub center_lng: f64,
    /// Scoring strategy (model or closed-form)
    #[serde(default = "default_scoring")]
    pub scoring: String,
}

// Default value functions
fn default_directions_base_url() -> String {
    "https://maps.googleapis.com/maps/api".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u32 {
    6
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("ecoroute").to_string_lossy().into_owned())
        .unwrap_or_else(|| ".ecoroute-cache".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_model_samples() -> usize {
    1000
}

fn default_model_epochs() -> usize {
    50
}

fn default_model_batch_size() -> usize {
    32
}

fn default_model_learning_rate() -> f64 {
    0.001
}

fn default_model_validation_split() -> f64 {
    0.2
}

fn default_model_seed() -> u64 {
    42
}

fn default_server_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    "frontend".to_string()
}

fn default_vehicle() -> String {
    "DRIVING".to_string()
}

fn default_center_lat() -> f64 {
    -15.793889
}

fn default_center_lng() -> f64 {
    -47.882778
}

fn default_scoring() -> String {
    "model".to_string()
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_directions_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            samples: default_model_samples(),
            epochs: default_model_epochs(),
            batch_size: default_model_batch_size(),
            learning_rate: default_model_learning_rate(),
            validation_split: default_model_validation_split(),
            seed: default_model_seed(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            vehicle: default_vehicle(),
            center_lat: default_center_lat(),
            center_lng: default_center_lng(),
            scoring: default_scoring(),
        }
    }
}

impl EcoRouteConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // ECOROUTE_WEATHER__API_KEY -> weather.api_key
        builder = builder.add_source(
            Environment::with_prefix("ECOROUTE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: EcoRouteConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.apply_provider_env_keys();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ecoroute").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.directions.base_url.is_empty() {
            self.directions.base_url = default_directions_base_url();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.directions.timeout_seconds == 0 {
            self.directions.timeout_seconds = default_timeout();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.model.samples == 0 {
            self.model.samples = default_model_samples();
        }
        if self.model.epochs == 0 {
            self.model.epochs = default_model_epochs();
        }
        if self.model.batch_size == 0 {
            self.model.batch_size = default_model_batch_size();
        }
        if self.defaults.vehicle.is_empty() {
            self.defaults.vehicle = default_vehicle();
        }
        if self.defaults.scoring.is_empty() {
            self.defaults.scoring = default_scoring();
        }
    }

    /// Fill missing API keys from the provider-conventional variables
    fn apply_provider_env_keys(&mut self) {
        if self.directions.api_key.is_none() {
            self.directions.api_key = std::env::var("GOOGLE_MAPS_API_KEY").ok();
        }
        if self.weather.api_key.is_none() {
            self.weather.api_key = std::env::var("OPENWEATHER_API_KEY").ok();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        for (name, key) in [
            ("Directions", &self.directions.api_key),
            ("Weather", &self.weather.api_key),
        ] {
            if let Some(api_key) = key {
                if api_key.is_empty() {
                    return Err(EcoRouteError::config(format!(
                        "{name} API key cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }

                if api_key.len() < 8 {
                    return Err(EcoRouteError::config(format!(
                        "{name} API key appears to be invalid (too short). Please check your API key."
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Require both provider keys; only route planning needs them
    pub fn require_api_keys(&self) -> Result<(String, String)> {
        let directions = self.directions.api_key.clone().ok_or_else(|| {
            EcoRouteError::config("Directions API key is required (GOOGLE_MAPS_API_KEY)")
        })?;
        let weather = self.weather.api_key.clone().ok_or_else(|| {
            EcoRouteError::config("Weather API key is required (OPENWEATHER_API_KEY)")
        })?;
        Ok((directions, weather))
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.directions.timeout_seconds > 300 || self.weather.timeout_seconds > 300 {
            return Err(EcoRouteError::config("API timeout cannot exceed 300 seconds").into());
        }

        if self.directions.max_retries > 10 || self.weather.max_retries > 10 {
            return Err(EcoRouteError::config("API max retries cannot exceed 10").into());
        }

        if self.cache.ttl_hours > 168 {
            return Err(
                EcoRouteError::config("Cache TTL cannot exceed 168 hours (1 week)").into(),
            );
        }

        if !(0.0..1.0).contains(&self.model.validation_split) {
            return Err(EcoRouteError::config(
                "Model validation split must be in the range [0, 1)",
            )
            .into());
        }

        if !(self.model.learning_rate > 0.0 && self.model.learning_rate <= 1.0) {
            return Err(
                EcoRouteError::config("Model learning rate must be in the range (0, 1]").into(),
            );
        }

        if !(-90.0..=90.0).contains(&self.defaults.center_lat)
            || !(-180.0..=180.0).contains(&self.defaults.center_lng)
        {
            return Err(EcoRouteError::config("Default map centre is out of range").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(EcoRouteError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(EcoRouteError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let valid_scoring = ["model", "closed-form"];
        if !valid_scoring.contains(&self.defaults.scoring.as_str()) {
            return Err(EcoRouteError::config(format!(
                "Invalid scoring strategy '{}'. Must be one of: {}",
                self.defaults.scoring,
                valid_scoring.join(", ")
            ))
            .into());
        }

        if self
            .defaults
            .vehicle
            .parse::<crate::models::VehicleType>()
            .is_err()
        {
            return Err(EcoRouteError::config(format!(
                "Invalid default vehicle '{}'",
                self.defaults.vehicle
            ))
            .into());
        }

        for url in [&self.directions.base_url, &self.weather.base_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(EcoRouteError::config(
                    "API base URLs must be valid HTTP or HTTPS URLs",
                )
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EcoRouteConfig::default();
        assert_eq!(
            config.directions.base_url,
            "https://maps.googleapis.com/maps/api"
        );
        assert_eq!(
            config.weather.base_url,
            "https://api.openweathermap.org/data/2.5"
        );
        assert_eq!(config.weather.timeout_seconds, 30);
        assert_eq!(config.model.epochs, 50);
        assert_eq!(config.model.batch_size, 32);
        assert_eq!(config.model.samples, 1000);
        assert_eq!(config.defaults.vehicle, "DRIVING");
        assert!(config.weather.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_short_api_key() {
        let mut config = EcoRouteConfig::default();
        config.weather.api_key = Some("short".to_string());
        let result = config.validate_api_keys();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("too short"));
    }

    #[test]
    fn test_require_api_keys() {
        let mut config = EcoRouteConfig::default();
        assert!(config.require_api_keys().is_err());

        config.directions.api_key = Some("directions_key_123".to_string());
        config.weather.api_key = Some("weather_key_123".to_string());
        let (directions, weather) = config.require_api_keys().unwrap();
        assert_eq!(directions, "directions_key_123");
        assert_eq!(weather, "weather_key_123");
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = EcoRouteConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = EcoRouteConfig::default();
        config.weather.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_unknown_vehicle() {
        let mut config = EcoRouteConfig::default();
        config.defaults.vehicle = "SPACESHIP".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_scoring() {
        let mut config = EcoRouteConfig::default();
        config.defaults.scoring = "closed-form".to_string();
        assert!(config.validate().is_ok());
        config.defaults.scoring = "random".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[model]\nepochs = 5\n\n[defaults]\nvehicle = \"CARGO_SMALL\"\n",
        )
        .unwrap();

        let config = EcoRouteConfig::load_from_path(Some(path)).unwrap();
        assert_eq!(config.model.epochs, 5);
        assert_eq!(config.model.batch_size, 32);
        assert_eq!(config.defaults.vehicle, "CARGO_SMALL");
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = EcoRouteConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("ecoroute"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
