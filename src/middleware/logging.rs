//! Logging middleware
//!
//! Logs every inbound event and the performance of provider calls.

use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn, Span};

use crate::controller::event::{EventKind, InboundEvent};
use crate::models::ModelKey;

/// Provider calls slower than this are flagged
const SLOW_CALL: Duration = Duration::from_secs(20);

#[derive(Clone)]
pub struct LoggingMiddleware {
    log_user_interactions: bool,
    log_performance: bool,
}

impl LoggingMiddleware {
    pub fn new(log_user_interactions: bool, log_performance: bool) -> Self {
        Self {
            log_user_interactions,
            log_performance,
        }
    }

    /// Log an inbound event before gating
    #[instrument(skip(self, event), fields(user_id = event.user_id))]
    pub fn log_event(&self, event: &InboundEvent) {
        if !self.log_user_interactions {
            return;
        }

        match &event.kind {
            EventKind::Command(command) => {
                info!(chat_id = event.chat_id, command = ?command, "Command received");
            }
            EventKind::Text(text) => {
                info!(chat_id = event.chat_id, length = text.chars().count(), "Text message received");
                debug!(text = %text, "Message text");
            }
            EventKind::Callback { data, .. } => {
                info!(chat_id = event.chat_id, callback_data = %data, "Callback query received");
            }
        }
    }

    /// Log duration and outcome of one provider call
    pub fn log_provider_call(&self, model: ModelKey, duration: Duration, success: bool) {
        if !self.log_performance {
            return;
        }

        let duration_ms = duration.as_millis() as u64;
        if success {
            info!(model = %model, duration_ms = duration_ms, "Provider call completed");
        } else {
            warn!(model = %model, duration_ms = duration_ms, "Provider call failed");
        }

        if duration > SLOW_CALL {
            warn!(model = %model, duration_ms = duration_ms, "Slow provider call detected");
        }
    }

    /// Create a performance tracking span
    pub fn create_performance_span(&self, operation: &str) -> Option<PerformanceTracker> {
        if self.log_performance {
            Some(PerformanceTracker::new(operation.to_string()))
        } else {
            None
        }
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new(true, true)
    }
}

/// Performance tracker for measuring operation duration
pub struct PerformanceTracker {
    operation: String,
    start_time: Instant,
    _span: Span,
}

impl PerformanceTracker {
    fn new(operation: String) -> Self {
        let span = tracing::info_span!("performance", operation = %operation);

        Self {
            operation,
            start_time: Instant::now(),
            _span: span,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Complete the performance tracking and log the result
    pub fn complete(self, success: bool) {
        let duration_ms = self.start_time.elapsed().as_millis() as u64;

        if success {
            debug!(operation = %self.operation, duration_ms = duration_ms, "Operation completed");
        } else {
            warn!(operation = %self.operation, duration_ms = duration_ms, "Operation failed");
        }
    }
}
