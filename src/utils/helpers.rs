//! Helper functions and utilities

use uuid::Uuid;

/// Generate a correlation id for a generation request
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Parse a Telegram user id typed by an admin
pub fn parse_user_id(text: &str) -> Option<i64> {
    let text = text.trim();
    text.strip_prefix("tg://user?id=")
        .unwrap_or(text)
        .parse::<i64>()
        .ok()
}

/// Parse a non-negative generation limit
pub fn parse_limit(text: &str) -> Option<u32> {
    text.trim().parse::<u32>().ok()
}
