//! Error types and handling for the airwatch engine and service

use axum::http::StatusCode;
use thiserror::Error;

/// Main error type for airwatch
#[derive(Error, Debug)]
pub enum AirwatchError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// An external collaborator (station feed, forecast source, profile store) failed
    #[error("Dependency unavailable: {dependency}: {message}")]
    DependencyUnavailable { dependency: String, message: String },

    /// An advisory was requested for an activity the engine does not know
    #[error("Unsupported activity: {activity}")]
    UnsupportedActivity { activity: String },

    /// Requested station or record does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl AirwatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new dependency error for the named collaborator
    pub fn dependency<D: Into<String>, S: Into<String>>(dependency: D, message: S) -> Self {
        Self::DependencyUnavailable {
            dependency: dependency.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_activity<S: Into<String>>(activity: S) -> Self {
        Self::UnsupportedActivity {
            activity: activity.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AirwatchError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            AirwatchError::Validation { message } => format!("Invalid input: {message}"),
            AirwatchError::DependencyUnavailable { dependency, .. } => {
                format!("The {dependency} is currently unavailable. Please try again later.")
            }
            AirwatchError::UnsupportedActivity { activity } => format!(
                "No advisory exists for '{activity}'. Supported activities: sport, commute, ventilation."
            ),
            AirwatchError::NotFound { message } => message.clone(),
            AirwatchError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }

    /// HTTP status used when this error crosses the API boundary
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            AirwatchError::Validation { .. } | AirwatchError::UnsupportedActivity { .. } => {
                StatusCode::BAD_REQUEST
            }
            AirwatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            AirwatchError::DependencyUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AirwatchError::Config { .. } | AirwatchError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = AirwatchError::config("bad port");
        assert!(matches!(config_err, AirwatchError::Config { .. }));

        let dep_err = AirwatchError::dependency("profile store", "connection refused");
        assert!(matches!(
            dep_err,
            AirwatchError::DependencyUnavailable { ref dependency, .. } if dependency == "profile store"
        ));

        let activity_err = AirwatchError::unsupported_activity("swimming");
        assert_eq!(activity_err.to_string(), "Unsupported activity: swimming");
    }

    #[test]
    fn test_user_messages() {
        let dep_err = AirwatchError::dependency("forecast source", "timeout");
        assert!(dep_err.user_message().contains("forecast source"));

        let validation_err = AirwatchError::validation("latitude out of range");
        assert!(validation_err.user_message().contains("latitude out of range"));

        let activity_err = AirwatchError::unsupported_activity("swimming");
        assert!(activity_err.user_message().contains("swimming"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AirwatchError::unsupported_activity("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AirwatchError::dependency("station feed", "down").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AirwatchError::not_found("station DL-1").status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AirwatchError = io_err.into();
        assert!(matches!(err, AirwatchError::Io { .. }));
    }
}
