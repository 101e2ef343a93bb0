//! PromptRelay Telegram Bot
//!
//! Relays user prompts to chat and image generation models behind a single
//! gateway, with per-model quotas, an admin panel, maintenance mode and a
//! channel subscription gate.

#![allow(non_snake_case)]

pub mod config;
pub mod controller;
pub mod delivery;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{RelayError, Result};

// Re-export main components for easy access
pub use controller::Controller;
pub use services::ServiceFactory;
pub use state::AppContext;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
