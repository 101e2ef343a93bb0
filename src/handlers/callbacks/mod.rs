//! Callback query handlers module

use std::sync::Arc;
use teloxide::{prelude::*, types::CallbackQuery};
use tracing::{debug, warn};

use crate::controller::{Controller, InboundEvent};
use crate::utils::errors::Result;

/// Acknowledge the press, then hand it to the controller
pub async fn handle_callback_query(bot: Bot, query: CallbackQuery, controller: Arc<Controller>) -> Result<()> {
    // Answer first to remove the loading state on the button
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, callback_id = %query.id, "Failed to answer callback query");
    }

    let Some(data) = query.data.clone() else {
        debug!(callback_id = %query.id, "Callback query without data ignored");
        return Ok(());
    };

    let user_id = query.from.id.0 as i64;
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id.0)
        .unwrap_or(user_id);

    controller
        .handle(InboundEvent::callback(chat_id, user_id, query.id.to_string(), data))
        .await
}
