//! Recording chat transport
//!
//! Captures everything the controller sends so tests can assert on replies
//! without talking to Telegram.

use std::sync::{Arc, Mutex};
use async_trait::async_trait;

use PromptRelay::delivery::{Button, ButtonAction, ChatTransport};
use PromptRelay::models::ImagePayload;
use PromptRelay::{RelayError, Result};

/// One outgoing message
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text { chat_id: i64, text: String },
    Markdown { chat_id: i64, text: String },
    Photo { chat_id: i64, image: ImagePayload },
    Menu { chat_id: i64, text: String, rows: Vec<Vec<Button>> },
    ReplyKeyboard { chat_id: i64, text: String, rows: Vec<Vec<String>> },
    RemoveKeyboard { chat_id: i64, text: String },
}

impl Sent {
    pub fn chat_id(&self) -> i64 {
        match self {
            Sent::Text { chat_id, .. }
            | Sent::Markdown { chat_id, .. }
            | Sent::Photo { chat_id, .. }
            | Sent::Menu { chat_id, .. }
            | Sent::ReplyKeyboard { chat_id, .. }
            | Sent::RemoveKeyboard { chat_id, .. } => *chat_id,
        }
    }

    /// Visible text, if the message has any
    pub fn text(&self) -> Option<&str> {
        match self {
            Sent::Text { text, .. }
            | Sent::Markdown { text, .. }
            | Sent::Menu { text, .. }
            | Sent::ReplyKeyboard { text, .. }
            | Sent::RemoveKeyboard { text, .. } => Some(text),
            Sent::Photo { .. } => None,
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<Sent>>>,
    fail_markdown: Arc<Mutex<bool>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `send_markdown` call fail, as Telegram does on bad markup
    pub fn fail_markdown(&self, fail: bool) {
        *self.fail_markdown.lock().unwrap() = fail;
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().iter().filter_map(|s| s.text().map(str::to_string)).collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.texts().pop()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t.contains(needle))
    }

    /// Callback data of the most recent inline menu
    pub fn last_menu_callbacks(&self) -> Vec<String> {
        self.sent()
            .iter()
            .rev()
            .find_map(|s| match s {
                Sent::Menu { rows, .. } => Some(rows.clone()),
                _ => None,
            })
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(|b| match b.action {
                ButtonAction::Callback(data) => Some(data),
                ButtonAction::Url(_) => None,
            })
            .collect()
    }

    pub fn photos(&self) -> Vec<ImagePayload> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Photo { image, .. } => Some(image),
                _ => None,
            })
            .collect()
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.record(Sent::Text { chat_id, text: text.to_string() });
        Ok(())
    }

    async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<()> {
        if *self.fail_markdown.lock().unwrap() {
            return Err(RelayError::InvalidInput("can't parse entities".to_string()));
        }
        self.record(Sent::Markdown { chat_id, text: text.to_string() });
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, image: &ImagePayload) -> Result<()> {
        self.record(Sent::Photo { chat_id, image: image.clone() });
        Ok(())
    }

    async fn send_menu(&self, chat_id: i64, text: &str, rows: &[Vec<Button>]) -> Result<()> {
        self.record(Sent::Menu { chat_id, text: text.to_string(), rows: rows.to_vec() });
        Ok(())
    }

    async fn send_reply_keyboard(&self, chat_id: i64, text: &str, rows: &[Vec<String>]) -> Result<()> {
        self.record(Sent::ReplyKeyboard { chat_id, text: text.to_string(), rows: rows.to_vec() });
        Ok(())
    }

    async fn remove_keyboard(&self, chat_id: i64, text: &str) -> Result<()> {
        self.record(Sent::RemoveKeyboard { chat_id, text: text.to_string() });
        Ok(())
    }
}
