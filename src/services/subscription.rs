//! Channel subscription checks

use async_trait::async_trait;
use futures::future::join_all;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberKind, Recipient, UserId};
use tracing::{debug, warn};

use crate::utils::errors::Result;

/// Answers whether a user is a member of every required channel
#[async_trait]
pub trait SubscriptionChecker: Send + Sync {
    /// `Err` means the check itself could not be performed
    async fn is_subscribed(&self, user_id: i64, channels: &[String]) -> Result<bool>;
}

/// Checks membership through `getChatMember`, one request per channel, concurrently
#[derive(Clone)]
pub struct TelegramSubscriptionChecker {
    bot: Bot,
}

impl TelegramSubscriptionChecker {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn is_member(&self, channel: &str, user_id: i64) -> Result<bool> {
        let member = self
            .bot
            .get_chat_member(Recipient::ChannelUsername(channel.to_string()), UserId(user_id as u64))
            .send()
            .await?;

        let present = !matches!(member.kind, ChatMemberKind::Left | ChatMemberKind::Banned(_));
        debug!(user_id = user_id, channel = channel, present = present, "Channel membership checked");
        Ok(present)
    }
}

#[async_trait]
impl SubscriptionChecker for TelegramSubscriptionChecker {
    async fn is_subscribed(&self, user_id: i64, channels: &[String]) -> Result<bool> {
        let checks = channels.iter().map(|channel| self.is_member(channel, user_id));

        let mut subscribed = true;
        for (channel, outcome) in channels.iter().zip(join_all(checks).await) {
            match outcome {
                Ok(present) => subscribed &= present,
                Err(e) => {
                    warn!(user_id = user_id, channel = %channel, error = %e, "Subscription check failed");
                    return Err(e);
                }
            }
        }

        Ok(subscribed)
    }
}

/// Fixed answer, for tests and deployments without required channels
#[derive(Debug, Clone, Copy)]
pub struct StaticSubscriptionChecker(pub bool);

#[async_trait]
impl SubscriptionChecker for StaticSubscriptionChecker {
    async fn is_subscribed(&self, _user_id: i64, _channels: &[String]) -> Result<bool> {
        Ok(self.0)
    }
}
