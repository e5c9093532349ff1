pub mod config;
pub mod error;
pub mod geo;

pub use config::{
    Config, CredentialsConfig, DefaultPlace, PlacesConfig, TemperatureUnit, ValidationResult,
    WeatherConfig,
};
pub use error::{
    AppError, ConfigError, CredentialError, DatabaseError, ReqwestErrorExt, RusqliteErrorExt,
    TransportError,
};
pub use geo::{Coordinate, InvalidCoordinate, PlaceReference};

use anyhow::Result;

/// Initialize logging for the application
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("Skyward core initialized");
    Ok(())
}
