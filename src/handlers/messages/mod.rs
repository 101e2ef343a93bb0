//! Message handlers module

use std::sync::Arc;
use teloxide::types::Message;
use tracing::debug;

use crate::controller::{Controller, InboundEvent};
use crate::utils::errors::{RelayError, Result};

/// Handle incoming text messages; other content is ignored
pub async fn handle_message(msg: Message, controller: Arc<Controller>) -> Result<()> {
    let user = msg
        .from
        .as_ref()
        .ok_or_else(|| RelayError::InvalidInput("No user in message".to_string()))?;

    let Some(text) = msg.text() else {
        debug!(user_id = user.id.0, chat_id = msg.chat.id.0, "Non-text message ignored");
        return Ok(());
    };

    controller
        .handle(InboundEvent::text(msg.chat.id.0, user.id.0 as i64, msg.id.0, text))
        .await
}
