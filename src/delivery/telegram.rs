//! Telegram implementation of [`ChatTransport`]

use std::future::IntoFuture;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton, KeyboardMarkup,
    KeyboardRemove, ParseMode,
};
use teloxide::RequestError;
use tracing::{debug, warn};

use crate::models::ImagePayload;
use crate::utils::errors::Result;
use super::{Button, ButtonAction, ChatTransport};

pub const RETRY_NOTICE: &str = "Too many requests, retrying...";

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Run a request; on `RetryAfter` notify the chat, wait as told and retry once
    async fn with_retry<T, F, R>(&self, chat_id: i64, request: F) -> Result<T>
    where
        F: Fn() -> R + Send + Sync,
        R: IntoFuture<Output = std::result::Result<T, RequestError>> + Send,
        R::IntoFuture: Send,
        T: Send,
    {
        match request().await {
            Ok(value) => Ok(value),
            Err(RequestError::RetryAfter(wait)) => {
                warn!(chat_id = chat_id, wait_seconds = wait.seconds(), "Telegram rate limit hit, retrying once");
                if let Err(e) = self.bot.send_message(ChatId(chat_id), RETRY_NOTICE).await {
                    debug!(chat_id = chat_id, error = %e, "Retry notice not delivered");
                }
                tokio::time::sleep(wait.duration()).await;
                Ok(request().await?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn inline_keyboard(rows: &[Vec<Button>]) -> Result<InlineKeyboardMarkup> {
    let mut keyboard = Vec::with_capacity(rows.len());
    for row in rows {
        let mut buttons = Vec::with_capacity(row.len());
        for button in row {
            buttons.push(match &button.action {
                ButtonAction::Callback(data) => InlineKeyboardButton::callback(button.label.clone(), data.clone()),
                ButtonAction::Url(link) => InlineKeyboardButton::url(button.label.clone(), url::Url::parse(link)?),
            });
        }
        keyboard.push(buttons);
    }
    Ok(InlineKeyboardMarkup::new(keyboard))
}

fn reply_keyboard(rows: &[Vec<String>]) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.iter()
            .map(|row| row.iter().map(|label| KeyboardButton::new(label.clone())).collect::<Vec<_>>())
            .collect::<Vec<_>>(),
    )
    .resize_keyboard()
    .one_time_keyboard()
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.with_retry(chat_id, || self.bot.send_message(ChatId(chat_id), text.to_string()))
            .await?;
        Ok(())
    }

    async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<()> {
        self.with_retry(chat_id, || {
            self.bot
                .send_message(ChatId(chat_id), text.to_string())
                .parse_mode(ParseMode::MarkdownV2)
        })
        .await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, image: &ImagePayload) -> Result<()> {
        let file = match image {
            ImagePayload::Bytes(bytes) => InputFile::memory(bytes.clone()).file_name("image.png"),
            ImagePayload::Url(link) => InputFile::url(url::Url::parse(link)?),
        };
        self.with_retry(chat_id, || self.bot.send_photo(ChatId(chat_id), file.clone()))
            .await?;
        Ok(())
    }

    async fn send_menu(&self, chat_id: i64, text: &str, rows: &[Vec<Button>]) -> Result<()> {
        let keyboard = inline_keyboard(rows)?;
        self.with_retry(chat_id, || {
            self.bot
                .send_message(ChatId(chat_id), text.to_string())
                .reply_markup(keyboard.clone())
        })
        .await?;
        Ok(())
    }

    async fn send_reply_keyboard(&self, chat_id: i64, text: &str, rows: &[Vec<String>]) -> Result<()> {
        let keyboard = reply_keyboard(rows);
        self.with_retry(chat_id, || {
            self.bot
                .send_message(ChatId(chat_id), text.to_string())
                .reply_markup(keyboard.clone())
        })
        .await?;
        Ok(())
    }

    async fn remove_keyboard(&self, chat_id: i64, text: &str) -> Result<()> {
        self.with_retry(chat_id, || {
            self.bot
                .send_message(ChatId(chat_id), text.to_string())
                .reply_markup(KeyboardRemove::new())
        })
        .await?;
        Ok(())
    }
}
