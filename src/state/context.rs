//! Conversation context management
//!
//! Per-user session data and the application-wide context that bundles the
//! shared services handed to the controller.

use std::collections::BTreeMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{BotConfig, Settings};
use crate::models::ModelKey;
use crate::providers::ProviderGateway;
use crate::services::{AdminStore, ServiceFactory, SubscriptionChecker};
use crate::utils::diagnostics::SharedSink;
use crate::utils::errors::{RelayError, Result};
use super::machine::{transition, ConversationState, Trigger};
use super::storage::SessionStore;

/// Application-wide context containing services and settings
#[derive(Clone)]
pub struct AppContext {
    pub bot: BotConfig,
    pub admin_store: Arc<AdminStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub gateway: Arc<dyn ProviderGateway>,
    pub subscriptions: Arc<dyn SubscriptionChecker>,
    pub sink: SharedSink,
}

impl AppContext {
    pub fn new(
        bot: BotConfig,
        admin_store: Arc<AdminStore>,
        sessions: Arc<dyn SessionStore>,
        gateway: Arc<dyn ProviderGateway>,
        subscriptions: Arc<dyn SubscriptionChecker>,
        sink: SharedSink,
    ) -> Self {
        Self {
            bot,
            admin_store,
            sessions,
            gateway,
            subscriptions,
            sink,
        }
    }

    /// Create from an initialized ServiceFactory
    pub fn from_factory(factory: ServiceFactory, settings: &Settings) -> Self {
        Self::new(
            settings.bot.clone(),
            factory.admin_store,
            factory.sessions,
            factory.gateway,
            factory.subscriptions,
            factory.sink,
        )
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("bot_admins", &self.bot.admin_ids)
            .field("required_channels", &self.bot.required_channels)
            .finish_non_exhaustive()
    }
}

/// Per-user conversation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: i64,
    pub is_subscribed: bool,
    /// Most recently chosen model
    pub selected_model: Option<ModelKey>,
    pub generation_counts: BTreeMap<ModelKey, u32>,
    pub state: ConversationState,
    pub updated_at: DateTime<Utc>,
}

impl UserSession {
    /// Defaults for a first interaction
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            is_subscribed: false,
            selected_model: None,
            generation_counts: ModelKey::ALL.iter().map(|m| (*m, 0)).collect(),
            state: ConversationState::Idle,
            updated_at: Utc::now(),
        }
    }

    pub fn count_for(&self, model: ModelKey) -> u32 {
        self.generation_counts.get(&model).copied().unwrap_or(0)
    }

    pub fn remaining(&self, model: ModelKey, limit: u32) -> u32 {
        limit.saturating_sub(self.count_for(model))
    }

    /// Move to the next state through the transition table
    pub fn apply(&mut self, trigger: Trigger) -> Result<ConversationState> {
        let next = transition(self.state, trigger)?;
        if let ConversationState::InScene(model) = next {
            self.selected_model = Some(model);
        }
        self.state = next;
        self.touch();
        Ok(next)
    }

    /// Increment only while below `limit`
    pub fn record_generation(&mut self, model: ModelKey, limit: u32) -> Result<u32> {
        let count = self.generation_counts.entry(model).or_insert(0);
        if *count >= limit {
            return Err(RelayError::QuotaExceeded { model, limit });
        }
        *count += 1;
        let updated = *count;
        self.touch();
        Ok(updated)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
