//! Error types and handling for the `EcoRoute` application

use std::collections::HashMap;

use thiserror::Error;

/// Machine-readable classification of API failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Provider rejected the API key
    ApiUnauthorized,
    /// Provider could not resolve the origin, destination or coordinates
    ApiLocationNotFound,
    /// Provider or client side rate limit
    ApiRateLimit,
    /// Transport failure or non-success HTTP status
    ApiNetworkError,
    /// Response body did not match the expected shape
    ApiInvalidResponse,
    /// Provider answered but found no route
    ApiNoRoute,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ApiUnauthorized => "api_unauthorized",
            ErrorCode::ApiLocationNotFound => "api_location_not_found",
            ErrorCode::ApiRateLimit => "api_rate_limit",
            ErrorCode::ApiNetworkError => "api_network_error",
            ErrorCode::ApiInvalidResponse => "api_invalid_response",
            ErrorCode::ApiNoRoute => "api_no_route",
        }
    }
}

/// Main error type for the `EcoRoute` application
#[derive(Error, Debug)]
pub enum EcoRouteError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Directions, geocoding or weather provider errors
    #[error("API error: {message}")]
    Api {
        message: String,
        code: ErrorCode,
        context: HashMap<String, String>,
    },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl EcoRouteError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error without extra context
    pub fn api<S: Into<String>>(message: S, code: ErrorCode) -> Self {
        Self::api_with_context(message, code, HashMap::new())
    }

    /// Create a new API error carrying request details for diagnostics
    pub fn api_with_context<S: Into<String>>(
        message: S,
        code: ErrorCode,
        context: HashMap<String, String>,
    ) -> Self {
        Self::Api {
            message: message.into(),
            code,
            context,
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Code of an API error, if this is one
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            EcoRouteError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            EcoRouteError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            EcoRouteError::Api { .. } => "Could not calculate route. Please try again.".to_string(),
            EcoRouteError::Validation { message } => message.clone(),
            EcoRouteError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            EcoRouteError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            EcoRouteError::General { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = EcoRouteError::config("missing API key");
        assert!(matches!(config_err, EcoRouteError::Config { .. }));

        let api_err = EcoRouteError::api("connection failed", ErrorCode::ApiNetworkError);
        assert!(matches!(api_err, EcoRouteError::Api { .. }));
        assert_eq!(api_err.code(), Some(ErrorCode::ApiNetworkError));

        let validation_err = EcoRouteError::validation("invalid coordinates");
        assert!(matches!(validation_err, EcoRouteError::Validation { .. }));
        assert_eq!(validation_err.code(), None);
    }

    #[test]
    fn test_user_messages() {
        let config_err = EcoRouteError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let api_err = EcoRouteError::api("REQUEST_DENIED", ErrorCode::ApiUnauthorized);
        assert_eq!(
            api_err.user_message(),
            "Could not calculate route. Please try again."
        );

        let validation_err =
            EcoRouteError::validation("Please enter both starting location and destination");
        assert_eq!(
            validation_err.user_message(),
            "Please enter both starting location and destination"
        );
    }

    #[test]
    fn test_api_context_is_kept() {
        let err = EcoRouteError::api_with_context(
            "bad payload",
            ErrorCode::ApiInvalidResponse,
            HashMap::from([("coordinates".to_string(), "1.0000,2.0000".to_string())]),
        );
        match err {
            EcoRouteError::Api { context, .. } => {
                assert_eq!(context.get("coordinates").unwrap(), "1.0000,2.0000");
            }
            _ => panic!("expected API error"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EcoRouteError = io_err.into();
        assert!(matches!(err, EcoRouteError::Io { .. }));
    }
}
