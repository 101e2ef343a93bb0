//! Middleware module
//!
//! Cross-cutting checks and logging applied to every inbound event

pub mod auth;
pub mod dedupe;
pub mod logging;

// Re-export commonly used middleware
pub use auth::AuthMiddleware;
pub use dedupe::{DedupeKey, DedupeMiddleware};
pub use logging::LoggingMiddleware;
