//! Delivery adapter
//!
//! [`ChatTransport`] is everything the bot needs from a chat platform;
//! [`Delivery`] renders generation results onto it.

pub mod telegram;

use std::sync::Arc;
use async_trait::async_trait;

use crate::models::{GenerationResult, ImagePayload};
use crate::utils::errors::{RelayError, Result};
use crate::utils::markup::{self, MarkupDialect, TELEGRAM_MESSAGE_LIMIT};

pub use telegram::TelegramTransport;

/// What pressing an inline button does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Callback(String),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self { label: label.into(), action: ButtonAction::Callback(data.into()) }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self { label: label.into(), action: ButtonAction::Url(url.into()) }
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Plain text, no markup parsing
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    /// MarkdownV2 text; the caller is responsible for escaping
    async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<()>;

    async fn send_photo(&self, chat_id: i64, image: &ImagePayload) -> Result<()>;

    /// Text with an inline keyboard, one `Vec` per row
    async fn send_menu(&self, chat_id: i64, text: &str, rows: &[Vec<Button>]) -> Result<()>;

    /// Text with a resized one-time reply keyboard
    async fn send_reply_keyboard(&self, chat_id: i64, text: &str, rows: &[Vec<String>]) -> Result<()>;

    /// Text that also removes any reply keyboard
    async fn remove_keyboard(&self, chat_id: i64, text: &str) -> Result<()>;
}

/// Renders [`GenerationResult`]s to a transport
#[derive(Clone)]
pub struct Delivery {
    transport: Arc<dyn ChatTransport>,
    dialect: MarkupDialect,
    chunk_limit: usize,
}

impl Delivery {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            dialect: MarkupDialect::MarkdownV2,
            chunk_limit: TELEGRAM_MESSAGE_LIMIT,
        }
    }

    pub fn with_chunk_limit(mut self, chunk_limit: usize) -> Self {
        self.chunk_limit = chunk_limit;
        self
    }

    /// Text goes out as ordered, escaped chunks; images as one photo.
    /// Failures are not renderable and are rejected.
    pub async fn deliver(&self, chat_id: i64, result: &GenerationResult) -> Result<()> {
        match result {
            GenerationResult::Text(text) => {
                for chunk in markup::prepare_messages(text, self.dialect, self.chunk_limit) {
                    self.transport.send_markdown(chat_id, &chunk).await?;
                }
                Ok(())
            }
            GenerationResult::Image(image) => self.transport.send_photo(chat_id, image).await,
            GenerationResult::Failure(kind) => Err(RelayError::InvalidInput(format!(
                "cannot deliver a failure: {}",
                kind
            ))),
        }
    }
}
