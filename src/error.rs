//! Error types for Palaver
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Broad classification of a [`PalaverError`]
///
/// Callers that only need to branch on the failure class (for example the
/// CLI choosing an exit message) can match on this instead of every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration, including credentials
    Configuration,
    /// Unknown session or model identifier
    NotFound,
    /// Caller supplied an invalid argument
    InvalidInput,
    /// The upstream provider call failed
    Upstream,
    /// Local IO, serialization or storage failure
    Io,
}

/// Main error type for Palaver operations
#[derive(Error, Debug)]
pub enum PalaverError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No API credential could be resolved for the provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// The session identifier is not live in the session table
    #[error("Session {0} does not exist")]
    SessionNotFound(String),

    /// The model identifier is not offered by the provider
    #[error("Model {model} is not available. Available models: {available}")]
    ModelNotFound {
        /// Requested model identifier
        model: String,
        /// Comma separated list of valid identifiers
        available: String,
    },

    /// Invalid caller input (blank identifiers, empty messages)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Export format not recognised
    #[error("Unsupported export format: {0}. Supported formats: json, txt")]
    UnsupportedFormat(String),

    /// Upstream provider errors (network, HTTP status, malformed body)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Attachment could not be found or read
    #[error("Attachment error: {0}")]
    Attachment(String),

    /// Session archive errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SQLite errors from the session archive
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl PalaverError {
    /// Classify this error
    ///
    /// # Examples
    ///
    /// ```
    /// use palaver::error::{ErrorKind, PalaverError};
    ///
    /// let err = PalaverError::SessionNotFound("abc".to_string());
    /// assert_eq!(err.kind(), ErrorKind::NotFound);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::MissingCredentials(_) => ErrorKind::Configuration,
            Self::SessionNotFound(_) | Self::ModelNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidInput(_) | Self::UnsupportedFormat(_) | Self::Attachment(_) => {
                ErrorKind::InvalidInput
            }
            Self::Upstream(_) | Self::Http(_) => ErrorKind::Upstream,
            Self::Storage(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Yaml(_)
            | Self::Database(_) => ErrorKind::Io,
        }
    }
}

/// Returns the [`ErrorKind`] of an `anyhow::Error` if it wraps a [`PalaverError`]
///
/// # Examples
///
/// ```
/// use palaver::error::{error_kind, ErrorKind, PalaverError};
///
/// let err: anyhow::Error = PalaverError::Upstream("boom".to_string()).into();
/// assert_eq!(error_kind(&err), Some(ErrorKind::Upstream));
/// ```
pub fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.downcast_ref::<PalaverError>().map(PalaverError::kind)
}

/// Result type alias for Palaver operations
///
/// Uses `anyhow::Error` so that context can be attached while propagating;
/// the underlying [`PalaverError`] is recoverable with `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = PalaverError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_session_not_found_display() {
        let error = PalaverError::SessionNotFound("1234".to_string());
        assert_eq!(error.to_string(), "Session 1234 does not exist");
    }

    #[test]
    fn test_model_not_found_display() {
        let error = PalaverError::ModelNotFound {
            model: "gpt-9".to_string(),
            available: "a, b".to_string(),
        };
        let s = error.to_string();
        assert!(s.contains("gpt-9 is not available"));
        assert!(s.contains("a, b"));
    }

    #[test]
    fn test_unsupported_format_display() {
        let error = PalaverError::UnsupportedFormat("xml".to_string());
        assert_eq!(
            error.to_string(),
            "Unsupported export format: xml. Supported formats: json, txt"
        );
    }

    #[test]
    fn test_missing_credentials_error_display() {
        let error = PalaverError::MissingCredentials("cerebras".to_string());
        assert_eq!(
            error.to_string(),
            "Missing credentials for provider: cerebras"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            PalaverError::MissingCredentials("x".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            PalaverError::SessionNotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            PalaverError::InvalidInput("x".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(PalaverError::Upstream("x".into()).kind(), ErrorKind::Upstream);
        assert_eq!(PalaverError::Storage("x".into()).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: PalaverError = io_error.into();
        assert!(matches!(error, PalaverError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: PalaverError = json_error.into();
        assert!(matches!(error, PalaverError::Serialization(_)));
    }

    #[test]
    fn test_error_kind_through_anyhow() {
        let err: anyhow::Error = PalaverError::SessionNotFound("s".into()).into();
        assert_eq!(error_kind(&err), Some(ErrorKind::NotFound));

        let other = anyhow::anyhow!("plain");
        assert_eq!(error_kind(&other), None);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PalaverError>();
    }
}
