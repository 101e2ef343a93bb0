//! Conversation controller
//!
//! Every inbound event passes the same gates in order: artificial delay,
//! duplicate suppression, maintenance. It is then handled under a per-user
//! lock, so a user's check-then-increment on quotas never interleaves with
//! another of their own events.

pub mod admin_flow;
pub mod event;
pub mod messages;
pub mod scenes;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::delivery::{Button, ChatTransport, Delivery};
use crate::middleware::{AuthMiddleware, DedupeMiddleware, LoggingMiddleware};
use crate::models::ModelKey;
use crate::providers::ProviderGateway;
use crate::services::{AdminStore, SubscriptionChecker};
use crate::state::{AppContext, ConversationState, SessionStore, Trigger, UserSession};
use crate::utils::diagnostics::{Diagnostic, SharedSink};
use crate::utils::errors::Result;
use crate::utils::logging::{log_gate_rejection, log_user_action};

pub use event::{BotCommand, EventKind, InboundEvent};

use messages::*;

const COMPONENT: &str = "controller";

/// Prune idle per-user locks once the map grows past this
const LOCK_PRUNE_THRESHOLD: usize = 1024;

pub struct Controller {
    sessions: Arc<dyn SessionStore>,
    admin_store: Arc<AdminStore>,
    gateway: Arc<dyn ProviderGateway>,
    subscriptions: Arc<dyn SubscriptionChecker>,
    transport: Arc<dyn ChatTransport>,
    delivery: Delivery,
    auth: AuthMiddleware,
    dedupe: DedupeMiddleware,
    logging: LoggingMiddleware,
    sink: SharedSink,
    required_channels: Vec<String>,
    event_delay: Duration,
    user_locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl Controller {
    pub fn new(ctx: &AppContext, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            sessions: ctx.sessions.clone(),
            admin_store: ctx.admin_store.clone(),
            gateway: ctx.gateway.clone(),
            subscriptions: ctx.subscriptions.clone(),
            delivery: Delivery::new(transport.clone()),
            transport,
            auth: AuthMiddleware::new(ctx.admin_store.clone()),
            dedupe: DedupeMiddleware::new(Duration::from_secs(ctx.bot.dedupe_window_seconds)),
            logging: LoggingMiddleware::default(),
            sink: ctx.sink.clone(),
            required_channels: ctx.bot.required_channels.clone(),
            event_delay: Duration::from_millis(ctx.bot.event_delay_ms),
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Process one event end to end
    #[instrument(skip(self, event), fields(user_id = event.user_id, chat_id = event.chat_id))]
    pub async fn handle(&self, event: InboundEvent) -> Result<()> {
        if !self.event_delay.is_zero() {
            tokio::time::sleep(self.event_delay).await;
        }
        self.logging.log_event(&event);

        if !event.is_start() {
            if let Some(key) = event.dedupe_key() {
                if !self.dedupe.check(key) {
                    log_gate_rejection(event.user_id, "dedupe");
                    return Ok(());
                }
            }
        }

        if !self.auth.passes_maintenance(event.user_id) {
            log_gate_rejection(event.user_id, "maintenance");
            return self.transport.send_text(event.chat_id, MAINTENANCE_NOTICE).await;
        }

        let lock = self.user_lock(event.user_id);
        let _guard = lock.lock().await;

        let tracker = self.logging.create_performance_span("handle_event");
        let result = self.dispatch(&event).await;
        if let Some(tracker) = tracker {
            tracker.complete(result.is_ok());
        }
        if let Err(e) = &result {
            self.sink.report(
                Diagnostic::new(e.severity(), COMPONENT, e.to_string()).for_user(event.user_id),
            );
        }
        result
    }

    async fn dispatch(&self, event: &InboundEvent) -> Result<()> {
        let session = self.sessions.get_or_create(event.user_id).await?;
        debug!(state = %session.state, "Dispatching event");

        match &event.kind {
            EventKind::Command(BotCommand::Start) => self.start(event, session).await,
            EventKind::Command(BotCommand::Reset) => self.reset(event).await,
            EventKind::Command(BotCommand::Admin) => self.open_admin(event, session).await,
            EventKind::Callback { data, .. } => self.on_callback(event, session, data).await,
            EventKind::Text(text) => self.on_text(event, session, text).await,
        }
    }

    async fn start(&self, event: &InboundEvent, mut session: UserSession) -> Result<()> {
        log_user_action(event.user_id, "start", None);
        self.transport.send_markdown(event.chat_id, &greeting(&self.required_channels)).await?;

        let checked = if self.required_channels.is_empty() {
            Ok(true)
        } else {
            self.subscriptions
                .is_subscribed(event.user_id, &self.required_channels)
                .await
        };

        let subscribed = checked.as_ref().map(|s| *s).unwrap_or(false);
        session.is_subscribed = subscribed;
        session.apply(Trigger::Start { subscribed })?;
        self.sessions.save(&session).await?;

        match checked {
            Ok(true) => self.show_model_menu(event.chat_id).await,
            Ok(false) => {
                log_gate_rejection(event.user_id, "subscription");
                let rows: Vec<Vec<Button>> = self
                    .required_channels
                    .iter()
                    .map(|channel| vec![Button::url(subscribe_button(channel), channel_link(channel))])
                    .collect();
                self.transport.send_menu(event.chat_id, SUBSCRIBE_PROMPT, &rows).await
            }
            Err(e) => {
                self.sink.report(
                    Diagnostic::warning(COMPONENT, format!("subscription check failed: {}", e))
                        .for_user(event.user_id),
                );
                self.transport.send_text(event.chat_id, SUBSCRIPTION_CHECK_FAILED).await
            }
        }
    }

    async fn reset(&self, event: &InboundEvent) -> Result<()> {
        self.sessions.reset(event.user_id).await?;
        log_user_action(event.user_id, "reset", None);
        self.transport.remove_keyboard(event.chat_id, SESSION_RESET).await
    }

    async fn on_callback(&self, event: &InboundEvent, session: UserSession, data: &str) -> Result<()> {
        let chosen = data.strip_prefix("model:").and_then(ModelKey::from_slug);
        match (session.state, chosen) {
            (ConversationState::SelectingModel, Some(model)) => self.choose_model(event, session, model).await,
            _ => {
                debug!(callback_data = %data, state = %session.state, "Callback ignored in current state");
                self.transport.send_text(event.chat_id, UNKNOWN_INPUT_HINT).await
            }
        }
    }

    async fn on_text(&self, event: &InboundEvent, session: UserSession, text: &str) -> Result<()> {
        match session.state {
            ConversationState::SelectingModel => match ModelKey::from_label(text) {
                Some(model) => self.choose_model(event, session, model).await,
                None => self.transport.send_text(event.chat_id, UNKNOWN_INPUT_HINT).await,
            },
            ConversationState::InScene(model) => {
                if text.trim().eq_ignore_ascii_case(END_DIALOG) {
                    self.end_dialog(event, session).await
                } else {
                    self.generate(event, session, model, text).await
                }
            }
            ConversationState::AdminFlow(step) => self.admin_input(event, session, step, text).await,
            ConversationState::Idle => self.transport.send_text(event.chat_id, UNKNOWN_INPUT_HINT).await,
        }
    }

    fn user_lock(&self, user_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.user_locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks.len() > LOCK_PRUNE_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks.entry(user_id).or_default().clone()
    }
}
