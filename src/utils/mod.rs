//! Utility modules
//!
//! Common utilities used throughout the application: error handling,
//! logging setup, diagnostics, markup sanitization and small helpers.

pub mod diagnostics;
pub mod errors;
pub mod helpers;
pub mod logging;
pub mod markup;

pub use diagnostics::{Diagnostic, DiagnosticsSink, MemorySink, SharedSink, TracingSink};
pub use errors::{RelayError, Result};
pub use markup::MarkupDialect;
