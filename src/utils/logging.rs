//! Logging configuration and setup
//!
//! Structured logging helpers for PromptRelay. Everything goes through
//! `tracing`; initialization installs a stdout layer and a daily rolling file.

use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::models::ModelKey;
use crate::utils::errors::{RelayError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "promptrelay.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| RelayError::Config(format!("Invalid log filter '{}': {}", config.level, e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .map_err(|e| RelayError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log user actions with structured data
pub fn log_user_action(user_id: i64, action: &str, details: Option<&str>) {
    info!(
        user_id = user_id,
        action = action,
        details = details,
        "User action performed"
    );
}

/// Log admin actions
pub fn log_admin_action(admin_id: i64, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin_id = admin_id,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log a finished generation round trip
pub fn log_generation(user_id: i64, model: ModelKey, duration_ms: u64, success: bool) {
    if success {
        info!(
            user_id = user_id,
            model = %model,
            duration_ms = duration_ms,
            "Generation completed"
        );
    } else {
        warn!(
            user_id = user_id,
            model = %model,
            duration_ms = duration_ms,
            "Generation failed"
        );
    }
}

/// Log an event rejected before reaching the state machine
pub fn log_gate_rejection(user_id: i64, gate: &str) {
    debug!(user_id = user_id, gate = gate, "Event rejected by gate");
}
