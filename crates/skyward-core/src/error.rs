//! Centralized error types for Skyward.
//!
//! This module provides the error kinds shared across crates:
//! - `TransportError` for upstream HTTP calls
//! - `CredentialError` for API key lookup
//! - `DatabaseError` for the local place store
//! - `ConfigError` for settings
//!
//! `AppError` aggregates them for the binary and exposes UI-appropriate text.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Transport(#[from] TransportError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Device location is not available yet")]
    NoLocation,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Transport(e) => e.user_message(),
            AppError::Database(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Credential(e) => e.user_message(),
            AppError::NoLocation => "Waiting for your location. Check location permissions.",
            AppError::BadRequest(_) => "The weather request could not be built. Check your settings.",
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Failures of a single upstream call.
///
/// Timeouts imposed by a wrapping policy surface as `Unreachable`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Response body did not match the expected schema: {0}")]
    BadBody(String),
}

impl TransportError {
    pub fn user_message(&self) -> &'static str {
        match self {
            TransportError::Unreachable(_) => "Unable to connect. Check your internet connection.",
            TransportError::ServerError { status, .. } if *status >= 500 => {
                "The weather service is experiencing issues. Please try again later."
            }
            TransportError::ServerError { status: 401, .. } => {
                "The weather API key was rejected. Check your settings."
            }
            TransportError::ServerError { .. } => "The weather request failed. Please try again.",
            TransportError::BadBody(_) => "Received unexpected weather data. Please try again.",
        }
    }

    /// Transient failures worth another attempt: connectivity, 5xx, 408 and 429.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Unreachable(_) => true,
            TransportError::ServerError { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            TransportError::BadBody(_) => false,
        }
    }
}

/// Database/storage errors (SQLite, local state).
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::ConnectionFailed(_) => {
                "Unable to access saved places. Try restarting the app."
            }
            DatabaseError::QueryFailed(_) => "A saved-places operation failed. Please try again.",
            DatabaseError::Corruption(_) => {
                "Saved places may be corrupted. Consider resetting app data."
            }
            DatabaseError::MigrationFailed(_) => {
                "Failed to update saved places. Try restarting the app."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// API key lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("No API key stored for {0}")]
    NotFound(String),

    #[error("Stored API key is empty")]
    Empty,

    #[error("Secure storage error: {0}")]
    StorageError(String),
}

impl CredentialError {
    pub fn user_message(&self) -> &'static str {
        match self {
            CredentialError::NotFound(_) | CredentialError::Empty => {
                "No weather API key configured. Add one in settings."
            }
            CredentialError::StorageError(_) => "Could not read the API key from secure storage.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_transport_error(self) -> TransportError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_transport_error(self) -> TransportError {
        if self.is_timeout() || self.is_connect() {
            TransportError::Unreachable(self.to_string())
        } else if let Some(status) = self.status() {
            TransportError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() {
            TransportError::BadBody(self.to_string())
        } else {
            TransportError::Unreachable(self.to_string())
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        match &self {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                DatabaseError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                DatabaseError::ConnectionFailed(self.to_string())
            }
            _ => DatabaseError::QueryFailed(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_conversion() {
        let err = CredentialError::NotFound("openweather".into());
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Credential(CredentialError::NotFound(_))));
    }

    #[test]
    fn test_user_message_propagation() {
        let app_err = AppError::Transport(TransportError::Unreachable("dns".into()));
        assert_eq!(
            app_err.user_message(),
            "Unable to connect. Check your internet connection."
        );
    }

    #[test]
    fn test_config_error_messages() {
        let app_err: AppError = ConfigError::ParseError("line 3".into()).into();
        assert_eq!(
            app_err.user_message(),
            "Configuration file is malformed. Check your settings."
        );
        assert!(ConfigError::Invalid("bad".into()).user_message().contains("Invalid"));
    }

    #[test]
    fn test_server_error_messages_by_status() {
        let unavailable = TransportError::ServerError {
            status: 503,
            message: "busy".into(),
        };
        assert!(unavailable.user_message().contains("try again later"));

        let unauthorized = TransportError::ServerError {
            status: 401,
            message: "bad key".into(),
        };
        assert!(unauthorized.user_message().contains("API key"));
    }

    #[test]
    fn test_retryable_transport_errors() {
        assert!(TransportError::Unreachable("reset".into()).is_retryable());
        assert!(TransportError::ServerError { status: 502, message: String::new() }.is_retryable());
        assert!(TransportError::ServerError { status: 429, message: String::new() }.is_retryable());
        assert!(TransportError::ServerError { status: 408, message: String::new() }.is_retryable());

        assert!(!TransportError::ServerError { status: 404, message: String::new() }.is_retryable());
        assert!(!TransportError::ServerError { status: 401, message: String::new() }.is_retryable());
        assert!(!TransportError::BadBody("eof".into()).is_retryable());
    }

    #[test]
    fn test_rusqlite_error_mapping() {
        let err = rusqlite::Error::QueryReturnedNoRows.into_database_error();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }
}
