//! User-facing texts

use std::collections::BTreeMap;

use crate::models::ModelKey;
use crate::utils::markup::{escape, MarkupDialect};

const GREETING_INTRO: &str = "Hello\\! I am an AI assistant bot\\. \
I can answer questions, write texts and draw pictures using several neural networks\\.";
pub const MODEL_MENU_PROMPT: &str = "Choose model:";
pub const SUBSCRIBE_PROMPT: &str = "To use the bot, subscribe to our channels and send /start again.";
pub const SUBSCRIPTION_CHECK_FAILED: &str = "Could not verify subscription. Please try again later.";
pub const MAINTENANCE_NOTICE: &str = "The bot is under maintenance. Please try again later.";
pub const APOLOGY: &str = "An error occurred while processing your request. Please try again later.";
pub const GENERATING_IMAGE: &str = "Generating image...";
pub const END_DIALOG: &str = "End dialog";
pub const DIALOG_ENDED: &str = "Dialog ended.";
pub const UNKNOWN_INPUT_HINT: &str = "Use /start to begin or pick a model from the menu.";
pub const SESSION_RESET: &str = "Your session has been reset. Send /start to begin again.";

pub const PERMISSION_DENIED: &str = "You do not have access to the admin panel.";
pub const ADMIN_MENU_PROMPT: &str = "Admin panel. Choose an action:";
pub const ADMIN_MENU_HINT: &str = "Choose an action from the menu.";
pub const ENTER_ADMIN_TO_ADD: &str = "Send the user ID of the new admin.";
pub const ENTER_ADMIN_TO_REMOVE: &str = "Send the user ID of the admin to remove.";
pub const INVALID_USER_ID: &str = "That is not a valid user ID. Send a numeric Telegram user ID.";
pub const CHOOSE_LIMIT_MODEL: &str = "Choose the model to change the limit for:";
pub const UNKNOWN_LIMIT_MODEL: &str = "Unknown model. Choose one of the buttons.";
pub const INVALID_LIMIT: &str = "Send a whole number, 0 or greater.";
pub const MAINTENANCE_ENABLED: &str = "Maintenance mode enabled.";
pub const MAINTENANCE_DISABLED: &str = "Maintenance mode disabled.";
pub const ADMIN_EXIT: &str = "Left the admin panel.";

pub fn subscribe_button(channel: &str) -> String {
    format!("Subscribe to {}", channel)
}

/// `@name` becomes `https://t.me/name`
pub fn channel_link(channel: &str) -> String {
    format!("https://t.me/{}", channel.trim_start_matches('@'))
}

/// MarkdownV2 greeting, listing the required channels as links
pub fn greeting(channels: &[String]) -> String {
    if channels.is_empty() {
        return GREETING_INTRO.to_string();
    }
    let mut text = format!("{}\n\n*Our channels:*", GREETING_INTRO);
    for channel in channels {
        let link = channel_link(channel).replace('\\', "\\\\").replace(')', "\\)");
        text.push_str(&format!("\n[{}]({})", escape(channel, MarkupDialect::MarkdownV2), link));
    }
    text.push_str("\n\nSubscribe to continue, then choose the model you want to work with\\.");
    text
}

pub fn scene_entry(model: ModelKey, limit: u32, remaining: u32) -> String {
    format!(
        "You have chosen the model: {}\n\
         Limit: {} generations, {} remaining.\n\
         To end the dialog, click the \"{}\" button.\n\
         Enter your request:",
        model.display_name(),
        limit,
        remaining,
        END_DIALOG
    )
}

pub fn quota_exceeded(model: ModelKey, limit: u32) -> String {
    format!(
        "You have used all {} generations for {}. Choose another model or contact an admin.",
        limit,
        model.label()
    )
}

pub fn remaining_generations(model: ModelKey, remaining: u32, limit: u32) -> String {
    format!("Generations left for {}: {} of {}.", model.label(), remaining, limit)
}

pub fn admin_added(user_id: i64) -> String {
    format!("User {} is now an admin.", user_id)
}

pub fn admin_removed(user_id: i64) -> String {
    format!("User {} is no longer an admin.", user_id)
}

pub fn enter_limit(model: ModelKey, current: u32) -> String {
    format!("Current limit for {} is {}. Send the new limit:", model.label(), current)
}

pub fn limit_updated(model: ModelKey, limit: u32) -> String {
    format!("Limit for {} set to {}.", model.label(), limit)
}

pub fn limits_overview(limits: &BTreeMap<ModelKey, u32>) -> String {
    let mut text = String::from("Generation limits:");
    for model in ModelKey::ALL {
        let limit = limits.get(&model).copied().unwrap_or(0);
        text.push_str(&format!("\n{}: {}", model.label(), limit));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_link() {
        assert_eq!(channel_link("@wbmdev"), "https://t.me/wbmdev");
        assert_eq!(channel_link("plain"), "https://t.me/plain");
    }

    #[test]
    fn test_greeting_lists_channels_as_links() {
        let text = greeting(&["@wbmdev".to_string(), "@ocg_news".to_string()]);
        assert!(text.starts_with(GREETING_INTRO));
        assert!(text.contains("[@wbmdev](https://t.me/wbmdev)"));
        assert!(text.contains("[@ocg\\_news](https://t.me/ocg_news)"));

        assert_eq!(greeting(&[]), GREETING_INTRO);
    }

    #[test]
    fn test_limits_overview_lists_every_model() {
        let limits: BTreeMap<_, _> = ModelKey::ALL.iter().map(|m| (*m, 3)).collect();
        let text = limits_overview(&limits);
        assert_eq!(text.lines().count(), ModelKey::ALL.len() + 1);
        assert!(text.contains("Chat-GPT: 3"));
    }
}
