//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod admin;
pub mod generation;
pub mod model_key;

// Re-export commonly used models
pub use admin::{AdminConfig, DEFAULT_ADMIN_ID, default_limit};
pub use generation::{FailureKind, GenerationResult, ImagePayload};
pub use model_key::{ModelKey, ModelKind};
