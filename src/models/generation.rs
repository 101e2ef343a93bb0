//! Normalized provider output

use std::fmt;
use serde::{Deserialize, Serialize};

/// Image produced by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// Raw image bytes (e.g. decoded base64 artifact)
    Bytes(Vec<u8>),
    /// Remote URL the transport can fetch
    Url(String),
}

/// Classified provider failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    RateLimited { retry_after_seconds: u64 },
    Upstream(String),
    Timeout,
    Malformed(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::RateLimited { retry_after_seconds } => {
                write!(f, "rate limited (retry after {}s)", retry_after_seconds)
            }
            FailureKind::Upstream(message) => write!(f, "upstream error: {}", message),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Malformed(detail) => write!(f, "malformed response: {}", detail),
        }
    }
}

/// Result of a single generate call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Text(String),
    Image(ImagePayload),
    Failure(FailureKind),
}

impl GenerationResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, GenerationResult::Failure(_))
    }
}

impl From<FailureKind> for GenerationResult {
    fn from(kind: FailureKind) -> Self {
        GenerationResult::Failure(kind)
    }
}
