//! Test context for unified test setup
//!
//! Builds a real [`Controller`] over in-memory stores, a recording transport
//! and a scripted gateway.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use async_trait::async_trait;

use PromptRelay::config::Settings;
use PromptRelay::controller::{BotCommand, Controller, InboundEvent};
use PromptRelay::models::ModelKey;
use PromptRelay::services::{AdminStore, MemoryAdminBackend, StaticSubscriptionChecker, SubscriptionChecker};
use PromptRelay::state::{AppContext, ConversationState, MemorySessionStore, SessionStore, UserSession};
use PromptRelay::utils::diagnostics::MemorySink;
use PromptRelay::{RelayError, Result};

use super::{RecordingTransport, ScriptedGateway};

pub const ADMIN_ID: i64 = 556348928;

/// Subscription checker whose call always fails
pub struct FailingSubscriptionChecker;

#[async_trait]
impl SubscriptionChecker for FailingSubscriptionChecker {
    async fn is_subscribed(&self, _user_id: i64, _channels: &[String]) -> Result<bool> {
        Err(RelayError::InvalidInput("chat not found".to_string()))
    }
}

/// Test configuration options
pub struct TestConfig {
    pub admins: Vec<i64>,
    pub channels: Vec<String>,
    pub subscriptions: Arc<dyn SubscriptionChecker>,
    pub dedupe_window_seconds: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            admins: vec![ADMIN_ID],
            channels: vec!["@wbmdev".to_string()],
            subscriptions: Arc::new(StaticSubscriptionChecker(true)),
            dedupe_window_seconds: 120,
        }
    }
}

pub struct TestContext {
    pub controller: Arc<Controller>,
    pub transport: RecordingTransport,
    pub gateway: ScriptedGateway,
    pub sessions: Arc<MemorySessionStore>,
    pub admin_store: Arc<AdminStore>,
    pub admin_backend: MemoryAdminBackend,
    pub sink: MemorySink,
    next_message_id: AtomicI32,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    pub fn with_config(config: TestConfig) -> Self {
        let sink = MemorySink::new();
        let admin_backend = MemoryAdminBackend::new();
        let admin_store = Arc::new(AdminStore::new(
            Arc::new(admin_backend.clone()),
            config.admins,
            Arc::new(sink.clone()),
        ));
        admin_store.init();

        let mut bot = Settings::default().bot;
        bot.token = "12345:test_token".to_string();
        bot.required_channels = config.channels;
        bot.event_delay_ms = 0;
        bot.dedupe_window_seconds = config.dedupe_window_seconds;

        let sessions = Arc::new(MemorySessionStore::new());
        let gateway = ScriptedGateway::new();
        let transport = RecordingTransport::new();

        let context = AppContext::new(
            bot,
            admin_store.clone(),
            sessions.clone(),
            Arc::new(gateway.clone()),
            config.subscriptions,
            Arc::new(sink.clone()),
        );
        let controller = Arc::new(Controller::new(&context, Arc::new(transport.clone())));

        Self {
            controller,
            transport,
            gateway,
            sessions,
            admin_store,
            admin_backend,
            sink,
            next_message_id: AtomicI32::new(1),
        }
    }

    fn message_id(&self) -> i32 {
        self.next_message_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Private chat: chat id equals user id
    pub async fn command(&self, user_id: i64, command: BotCommand) -> Result<()> {
        let event = InboundEvent::command(user_id, user_id, self.message_id(), command);
        self.controller.handle(event).await
    }

    pub async fn text(&self, user_id: i64, text: &str) -> Result<()> {
        let event = InboundEvent::text(user_id, user_id, self.message_id(), text);
        self.controller.handle(event).await
    }

    pub async fn press(&self, user_id: i64, data: &str) -> Result<()> {
        let id = format!("cb-{}", self.message_id());
        self.controller.handle(InboundEvent::callback(user_id, user_id, id, data)).await
    }

    pub async fn session(&self, user_id: i64) -> UserSession {
        self.sessions.get_or_create(user_id).await.unwrap()
    }

    pub async fn state(&self, user_id: i64) -> ConversationState {
        self.session(user_id).await.state
    }

    /// `/start` followed by picking `model` from the inline menu
    pub async fn enter_scene(&self, user_id: i64, model: ModelKey) {
        self.command(user_id, BotCommand::Start).await.unwrap();
        self.press(user_id, &model.callback_data()).await.unwrap();
        assert_eq!(self.state(user_id).await, ConversationState::InScene(model));
    }
}
