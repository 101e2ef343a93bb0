//! Model selection and generation scenes

use std::time::Instant;
use tracing::{info_span, warn, Instrument};

use crate::delivery::Button;
use crate::models::{GenerationResult, ModelKey};
use crate::state::{Trigger, UserSession};
use crate::utils::diagnostics::Diagnostic;
use crate::utils::errors::{RelayError, Result};
use crate::utils::helpers::generate_request_id;
use crate::utils::logging::{log_gate_rejection, log_generation, log_user_action};
use super::event::InboundEvent;
use super::messages::*;
use super::{Controller, COMPONENT};

/// Two models per row, in menu order
pub fn model_menu_rows() -> Vec<Vec<Button>> {
    ModelKey::ALL
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|model| Button::callback(model.label(), model.callback_data()))
                .collect()
        })
        .collect()
}

impl Controller {
    pub(super) async fn show_model_menu(&self, chat_id: i64) -> Result<()> {
        self.transport.send_menu(chat_id, MODEL_MENU_PROMPT, &model_menu_rows()).await
    }

    pub(super) async fn choose_model(&self, event: &InboundEvent, mut session: UserSession, model: ModelKey) -> Result<()> {
        session.apply(Trigger::ChooseModel(model))?;
        self.sessions.save(&session).await?;
        log_user_action(event.user_id, "choose_model", Some(model.quota_key()));

        let limit = self.admin_store.generation_limit(model);
        let text = scene_entry(model, limit, session.remaining(model, limit));
        self.transport
            .send_reply_keyboard(event.chat_id, &text, &[vec![END_DIALOG.to_string()]])
            .await
    }

    pub(super) async fn end_dialog(&self, event: &InboundEvent, mut session: UserSession) -> Result<()> {
        session.apply(Trigger::EndDialog)?;
        self.sessions.save(&session).await?;

        self.transport.remove_keyboard(event.chat_id, DIALOG_ENDED).await?;
        self.show_model_menu(event.chat_id).await
    }

    /// Quota check, provider call, delivery, then the conditional increment
    pub(super) async fn generate(
        &self,
        event: &InboundEvent,
        session: UserSession,
        model: ModelKey,
        prompt: &str,
    ) -> Result<()> {
        let limit = self.admin_store.generation_limit(model);
        if session.count_for(model) >= limit {
            log_gate_rejection(event.user_id, "quota");
            return self.transport.send_text(event.chat_id, &quota_exceeded(model, limit)).await;
        }

        if model.is_image() {
            self.transport.send_text(event.chat_id, GENERATING_IMAGE).await?;
        }

        let request_id = generate_request_id();
        let span = info_span!("generation", request_id = %request_id, model = %model);
        let started = Instant::now();
        let result = self
            .gateway
            .generate(model, prompt, event.user_id)
            .instrument(span)
            .await;
        let delivered = match &result {
            // Already reported by the gateway
            GenerationResult::Failure(kind) => Err(RelayError::Provider(kind.clone())),
            _ => self.delivery.deliver(event.chat_id, &result).await.map_err(|e| {
                self.sink.report(
                    Diagnostic::error(COMPONENT, format!("delivery of {} result failed: {}", model, e))
                        .for_user(event.user_id),
                );
                e
            }),
        };
        log_generation(event.user_id, model, started.elapsed().as_millis() as u64, delivered.is_ok());

        if delivered.is_err() {
            return self.recover_from_failure(event, session).await;
        }

        match self.sessions.record_generation_used(event.user_id, model, limit).await {
            Ok(count) => {
                let text = remaining_generations(model, limit.saturating_sub(count), limit);
                self.transport.send_text(event.chat_id, &text).await
            }
            Err(RelayError::QuotaExceeded { .. }) => {
                warn!(user_id = event.user_id, model = %model, "Quota reached while generating");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Apologize and fall back to the model menu
    async fn recover_from_failure(&self, event: &InboundEvent, mut session: UserSession) -> Result<()> {
        self.transport.send_text(event.chat_id, APOLOGY).await?;
        session.apply(Trigger::GenerationFailed)?;
        self.sessions.save(&session).await?;
        self.show_model_menu(event.chat_id).await
    }
}
