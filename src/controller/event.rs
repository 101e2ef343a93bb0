//! Platform-neutral inbound events

use crate::middleware::dedupe::DedupeKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Admin,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Command(BotCommand),
    Text(String),
    /// Inline button press; `id` is the platform's unique query id
    Callback { id: String, data: String },
}

/// One user interaction as seen by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: i64,
    pub user_id: i64,
    pub message_id: Option<i32>,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn command(chat_id: i64, user_id: i64, message_id: i32, command: BotCommand) -> Self {
        Self {
            chat_id,
            user_id,
            message_id: Some(message_id),
            kind: EventKind::Command(command),
        }
    }

    pub fn text(chat_id: i64, user_id: i64, message_id: i32, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            user_id,
            message_id: Some(message_id),
            kind: EventKind::Text(text.into()),
        }
    }

    pub fn callback(chat_id: i64, user_id: i64, id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            chat_id,
            user_id,
            message_id: None,
            kind: EventKind::Callback { id: id.into(), data: data.into() },
        }
    }

    /// `/start` is exempt from duplicate suppression
    pub fn is_start(&self) -> bool {
        matches!(self.kind, EventKind::Command(BotCommand::Start))
    }

    pub fn dedupe_key(&self) -> Option<DedupeKey> {
        match &self.kind {
            EventKind::Callback { id, .. } => Some(DedupeKey::Callback(id.clone())),
            _ => self.message_id.map(|message_id| DedupeKey::Message {
                chat_id: self.chat_id,
                message_id,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keys() {
        let text = InboundEvent::text(5, 7, 11, "hello");
        assert_eq!(text.dedupe_key(), Some(DedupeKey::Message { chat_id: 5, message_id: 11 }));

        let press = InboundEvent::callback(5, 7, "q-1", "model:Claude");
        assert_eq!(press.dedupe_key(), Some(DedupeKey::Callback("q-1".to_string())));
    }

    #[test]
    fn test_is_start() {
        assert!(InboundEvent::command(1, 1, 1, BotCommand::Start).is_start());
        assert!(!InboundEvent::command(1, 1, 1, BotCommand::Reset).is_start());
        assert!(!InboundEvent::text(1, 1, 1, "/start").is_start());
    }
}
