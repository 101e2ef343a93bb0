//! Command handlers module

use std::sync::Arc;
use teloxide::{types::Message, utils::command::BotCommands};
use tracing::debug;

use crate::controller::{BotCommand, Controller, InboundEvent};
use crate::utils::errors::{RelayError, Result};

/// All available bot commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "PromptRelay commands:")]
pub enum Command {
    #[command(description = "Start the bot and choose a model")]
    Start,
    #[command(description = "Admin panel (admin only)")]
    Admin,
    #[command(description = "Reset your session")]
    Reset,
}

impl From<Command> for BotCommand {
    fn from(command: Command) -> Self {
        match command {
            Command::Start => BotCommand::Start,
            Command::Admin => BotCommand::Admin,
            Command::Reset => BotCommand::Reset,
        }
    }
}

/// Main command dispatcher
pub async fn handle_command(msg: Message, cmd: Command, controller: Arc<Controller>) -> Result<()> {
    let user = msg
        .from
        .as_ref()
        .ok_or_else(|| RelayError::InvalidInput("No user in message".to_string()))?;

    debug!(user_id = user.id.0, command = ?cmd, "Routing command");
    let event = InboundEvent::command(msg.chat.id.0, user.id.0 as i64, msg.id.0, cmd.into());
    controller.handle(event).await
}
