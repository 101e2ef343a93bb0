//! Duplicate update suppression
//!
//! Telegram redelivers updates after network hiccups. A message (chat plus
//! message id) or callback query (query id) seen again within the trailing
//! window is dropped. Every button tap is its own callback query, so repeated
//! taps are separate events and are not suppressed here.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Identity of an inbound event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupeKey {
    Message { chat_id: i64, message_id: i32 },
    Callback(String),
}

#[derive(Clone)]
pub struct DedupeMiddleware {
    window: Duration,
    seen: Arc<Mutex<HashMap<DedupeKey, Instant>>>,
}

impl DedupeMiddleware {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns `true` when the event is new and should be processed
    pub fn check(&self, key: DedupeKey) -> bool {
        self.check_at(key, Instant::now())
    }

    /// Same as [`DedupeMiddleware::check`] with an explicit clock
    pub fn check_at(&self, key: DedupeKey, now: Instant) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());

        // Prune expired entries so the map stays bounded by the window
        let window = self.window;
        seen.retain(|_, at| now.saturating_duration_since(*at) < window);

        if seen.contains_key(&key) {
            debug!(key = ?key, "Duplicate event dropped");
            return false;
        }

        seen.insert(key, now);
        true
    }

    pub fn tracked(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for DedupeMiddleware {
    fn default() -> Self {
        Self::new(Duration::from_secs(120))
    }
}
