//! Error handling for PromptRelay
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;
use crate::models::{FailureKind, ModelKey};

/// Main error type for PromptRelay application
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Provider failure: {0}")]
    Provider(FailureKind),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid admin configuration: {}", .0.join("; "))]
    AdminConfigInvalid(Vec<String>),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Generation quota exceeded for {model}: limit {limit}")]
    QuotaExceeded { model: ModelKey, limit: u32 },

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for PromptRelay operations
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            RelayError::Telegram(_) => true,
            RelayError::Provider(_) => true,
            RelayError::Config(_) => false,
            RelayError::AdminConfigInvalid(_) => true,
            RelayError::PermissionDenied(_) => false,
            RelayError::QuotaExceeded { .. } => false,
            RelayError::UnknownModel(_) => false,
            RelayError::InvalidStateTransition { .. } => false,
            RelayError::Redis(_) => true,
            RelayError::Http(_) => true,
            RelayError::Serialization(_) => false,
            RelayError::Io(_) => true,
            RelayError::UrlParse(_) => false,
            RelayError::InvalidInput(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RelayError::Config(_) => ErrorSeverity::Critical,
            RelayError::AdminConfigInvalid(_) => ErrorSeverity::Warning,
            RelayError::PermissionDenied(_) => ErrorSeverity::Warning,
            RelayError::QuotaExceeded { .. } => ErrorSeverity::Info,
            RelayError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_error_message() {
        let err = RelayError::QuotaExceeded { model: ModelKey::ChatGpt, limit: 10 };
        assert_eq!(err.to_string(), "Generation quota exceeded for chatGpt: limit 10");
        assert_eq!(err.severity(), ErrorSeverity::Info);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_admin_config_messages_joined() {
        let err = RelayError::AdminConfigInvalid(vec![
            "admins must be an array of integers".to_string(),
            "maintenanceMode must be a boolean".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid admin configuration: admins must be an array of integers; maintenanceMode must be a boolean"
        );
    }
}
