//! Error types for the Jira issue collector
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! The collector distinguishes two failure classes: fatal errors abort the
//! current pass before the checkpoint is advanced, per-record errors are
//! handled inline by the driver (see [`crate::collector::RecordOutcome`])
//! and never surface as an `Error`.

use thiserror::Error;

/// The main error type for the collector
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Account '{account}' is not configured properly: {message}")]
    Account { account: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // Checkpoint Errors
    // ============================================================================
    #[error("Checkpoint error: {message}")]
    Checkpoint { message: String },

    // ============================================================================
    // Sink Errors
    // ============================================================================
    #[error("Failed to emit event: {message}")]
    Emit { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an account configuration error
    pub fn account(account: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Account {
            account: account.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a checkpoint error
    pub fn checkpoint(message: impl Into<String>) -> Self {
        Self::Checkpoint {
            message: message.into(),
        }
    }

    /// Create an emit error
    pub fn emit(message: impl Into<String>) -> Self {
        Self::Emit {
            message: message.into(),
        }
    }
}

/// Result type alias for the collector
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("jql");
        assert_eq!(err.to_string(), "Missing required config field: jql");

        let err = Error::http_status(500, "Internal Server Error");
        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");

        let err = Error::account("jira-prod", "missing username");
        assert_eq!(
            err.to_string(),
            "Account 'jira-prod' is not configured properly: missing username"
        );

        let err = Error::checkpoint("disk full");
        assert_eq!(err.to_string(), "Checkpoint error: disk full");
    }
}
