//! Structured diagnostics sink
//!
//! Components report recoverable failures here instead of printing them, so
//! the same events reach `tracing` in production and can be asserted on in tests.

use std::sync::{Arc, Mutex};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::utils::errors::ErrorSeverity;

/// A single reported event
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: ErrorSeverity,
    /// Component that produced the event (e.g. "admin_store", "gateway")
    pub component: &'static str,
    pub message: String,
    pub user_id: Option<i64>,
    pub at: DateTime<Utc>,
}

impl Diagnostic {
    pub fn new(severity: ErrorSeverity, component: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            component,
            message: message.into(),
            user_id: None,
            at: Utc::now(),
        }
    }

    pub fn warning(component: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorSeverity::Warning, component, message)
    }

    pub fn error(component: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorSeverity::Error, component, message)
    }

    pub fn for_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

pub trait DiagnosticsSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

pub type SharedSink = Arc<dyn DiagnosticsSink>;

/// Forwards diagnostics to `tracing`
#[derive(Debug, Default, Clone)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn report(&self, d: Diagnostic) {
        match d.severity {
            ErrorSeverity::Info => info!(component = d.component, user_id = d.user_id, "{}", d.message),
            ErrorSeverity::Warning => warn!(component = d.component, user_id = d.user_id, "{}", d.message),
            ErrorSeverity::Error | ErrorSeverity::Critical => {
                error!(component = d.component, user_id = d.user_id, severity = %d.severity, "{}", d.message)
            }
        }
    }
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn from_component(&self, component: &str) -> Vec<Diagnostic> {
        self.entries()
            .into_iter()
            .filter(|d| d.component == component)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl DiagnosticsSink for MemorySink {
    fn report(&self, diagnostic: Diagnostic) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records() {
        let sink = MemorySink::new();
        sink.report(Diagnostic::warning("admin_store", "fell back to defaults"));
        sink.report(Diagnostic::error("gateway", "timeout").for_user(7));

        assert_eq!(sink.entries().len(), 2);
        let gateway = sink.from_component("gateway");
        assert_eq!(gateway.len(), 1);
        assert_eq!(gateway[0].user_id, Some(7));
        assert_eq!(gateway[0].severity, ErrorSeverity::Error);
    }

    #[test]
    fn test_clones_share_entries() {
        let sink = MemorySink::new();
        let shared: SharedSink = Arc::new(sink.clone());
        shared.report(Diagnostic::warning("controller", "x"));
        assert!(!sink.is_empty());
    }
}
