use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;
use crate::geo::{Coordinate, PlaceReference};

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Weather API settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Where the API key is looked up
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Saved places storage
    #[serde(default)]
    pub places: PlacesConfig,

    /// Place shown when no device location is available
    #[serde(default)]
    pub default_place: Option<DefaultPlace>,
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Fahrenheit,
    Celsius,
    Kelvin,
}

impl TemperatureUnit {
    /// Convert a temperature delivered in Kelvin to this unit.
    pub fn convert_kelvin(self, kelvin: f64) -> f64 {
        match self {
            TemperatureUnit::Kelvin => kelvin,
            TemperatureUnit::Celsius => kelvin - 273.15,
            TemperatureUnit::Fahrenheit => (kelvin - 273.15) * 9.0 / 5.0 + 32.0,
        }
    }

    /// Whole-degree label such as `72°`.
    pub fn format_degrees(self, kelvin: f64) -> String {
        format!("{:.0}°", self.convert_kelvin(kelvin))
    }

    /// High/low label such as `H:75° L:50°`.
    pub fn high_low_label(self, max_kelvin: f64, min_kelvin: f64) -> String {
        format!(
            "H:{} L:{}",
            self.format_degrees(max_kelvin),
            self.format_degrees(min_kelvin)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the forecast and geocoding endpoints
    #[serde(default = "default_weather_endpoint")]
    pub endpoint: String,

    /// Temperature unit preference
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    /// Refresh interval in minutes while a forecast is on screen
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries for transient upstream failures (0 disables retrying)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_weather_endpoint() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_refresh_minutes() -> u32 {
    15
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            endpoint: default_weather_endpoint(),
            temperature_unit: TemperatureUnit::default(),
            refresh_minutes: default_refresh_minutes(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl WeatherConfig {
    /// Refresh interval as a duration, `None` when refreshing is disabled.
    pub fn refresh_interval(&self) -> Option<std::time::Duration> {
        if self.refresh_minutes == 0 {
            None
        } else {
            Some(std::time::Duration::from_secs(u64::from(self.refresh_minutes) * 60))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Keyring service name holding the API key
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,

    /// Keyring account name holding the API key
    #[serde(default = "default_keyring_user")]
    pub keyring_user: String,

    /// Environment variable checked before the keyring
    #[serde(default = "default_env_var")]
    pub env_var: String,
}

fn default_keyring_service() -> String {
    "skyward".to_string()
}

fn default_keyring_user() -> String {
    "openweather".to_string()
}

fn default_env_var() -> String {
    "OPENWEATHER_API_KEY".to_string()
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            keyring_service: default_keyring_service(),
            keyring_user: default_keyring_user(),
            env_var: default_env_var(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    /// SQLite file name, relative to the config directory unless absolute
    #[serde(default = "default_places_database")]
    pub database_file: String,
}

fn default_places_database() -> String {
    "places.db".to_string()
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            database_file: default_places_database(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultPlace {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl DefaultPlace {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn to_reference(&self) -> PlaceReference {
        PlaceReference::named(format!("default:{}", self.name), self.coordinate(), self.name.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skyward");

        Self {
            config_dir,
            weather: WeatherConfig::default(),
            credentials: CredentialsConfig::default(),
            places: PlacesConfig::default(),
            default_place: None,
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, creating default if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let mut config = Self::default();
            if let Some(parent) = config_path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(config_path)?;
            tracing::info!("Created default config at {}", config_path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.endpoint, "weather.endpoint", &mut result);

        if self.weather.refresh_minutes == 0 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather refresh disabled (0 minutes)",
            );
        } else if self.weather.refresh_minutes > 1440 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather refresh interval is more than 24 hours",
            );
        }

        if self.weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.weather.max_retries > 10 {
            result.add_warning(
                "weather.max_retries",
                "More than 10 retries will delay error reporting considerably",
            );
        }

        if self.credentials.keyring_service.is_empty() {
            result.add_error("credentials.keyring_service", "Keyring service cannot be empty");
        }

        if self.places.database_file.trim().is_empty() {
            result.add_error("places.database_file", "Database file name cannot be empty");
        }

        if let Some(place) = &self.default_place {
            if !(-90.0..=90.0).contains(&place.latitude) {
                result.add_error(
                    "default_place.latitude",
                    format!("Latitude must be between -90 and 90, got: {}", place.latitude),
                );
            }
            if !(-180.0..=180.0).contains(&place.longitude) {
                result.add_error(
                    "default_place.longitude",
                    format!("Longitude must be between -180 and 180, got: {}", place.longitude),
                );
            }
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                } else if url.scheme() == "http" {
                    result.add_warning(field_name, "API key will be sent over plain http");
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Absolute path of the saved-places database
    pub fn places_database_path(&self) -> PathBuf {
        let file = PathBuf::from(&self.places.database_file);
        if file.is_absolute() {
            file
        } else {
            self.config_dir.join(file)
        }
    }

    /// Save configuration to the default file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skyward");

        Ok(config_dir.join("config.toml"))
    }
}
