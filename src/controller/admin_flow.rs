//! Admin panel flow
//!
//! Admin rights are re-checked on every input, so a revocation takes effect
//! mid-flow.

use tracing::warn;

use crate::models::ModelKey;
use crate::state::{AdminFlowId, AdminMenuChoice, Trigger, UserSession};
use crate::utils::errors::Result;
use crate::utils::helpers::{parse_limit, parse_user_id};
use crate::utils::logging::{log_admin_action, log_gate_rejection};
use super::event::InboundEvent;
use super::messages::*;
use super::Controller;

fn admin_menu_rows() -> Vec<Vec<String>> {
    AdminMenuChoice::ALL
        .chunks(2)
        .map(|row| row.iter().map(|choice| choice.label().to_string()).collect())
        .collect()
}

fn model_label_rows() -> Vec<Vec<String>> {
    ModelKey::ALL
        .chunks(2)
        .map(|row| row.iter().map(|model| model.label().to_string()).collect())
        .collect()
}

impl Controller {
    pub(super) async fn open_admin(&self, event: &InboundEvent, mut session: UserSession) -> Result<()> {
        if self.auth.check_admin_auth(event.user_id).is_err() {
            log_gate_rejection(event.user_id, "admin");
            return self.transport.send_text(event.chat_id, PERMISSION_DENIED).await;
        }

        session.apply(Trigger::OpenAdmin)?;
        self.sessions.save(&session).await?;
        log_admin_action(event.user_id, "open_admin", None, None);
        self.show_admin_menu(event.chat_id, ADMIN_MENU_PROMPT).await
    }

    async fn show_admin_menu(&self, chat_id: i64, text: &str) -> Result<()> {
        self.transport.send_reply_keyboard(chat_id, text, &admin_menu_rows()).await
    }

    pub(super) async fn admin_input(
        &self,
        event: &InboundEvent,
        mut session: UserSession,
        step: AdminFlowId,
        text: &str,
    ) -> Result<()> {
        let admin_id = event.user_id;
        let chat_id = event.chat_id;

        if !self.auth.is_admin(admin_id) {
            warn!(user_id = admin_id, step = ?step, "Admin rights revoked during admin flow");
            session.apply(Trigger::AdminRevoked)?;
            self.sessions.save(&session).await?;
            return self.transport.remove_keyboard(chat_id, PERMISSION_DENIED).await;
        }

        match step {
            AdminFlowId::Menu => self.admin_menu_choice(event, session, text).await,
            AdminFlowId::AddAdmin | AdminFlowId::RemoveAdmin => {
                let Some(target) = parse_user_id(text) else {
                    return self.transport.send_text(chat_id, INVALID_USER_ID).await;
                };
                let target_str = target.to_string();

                let reply = if step == AdminFlowId::AddAdmin {
                    self.admin_store.add_admin(target);
                    log_admin_action(admin_id, "add_admin", Some(&target_str), None);
                    admin_added(target)
                } else {
                    self.admin_store.remove_admin(target);
                    log_admin_action(admin_id, "remove_admin", Some(&target_str), None);
                    admin_removed(target)
                };

                session.apply(Trigger::AdminInputApplied)?;
                self.sessions.save(&session).await?;
                self.transport.send_text(chat_id, &reply).await
            }
            AdminFlowId::ChooseLimitModel => match ModelKey::from_label(text) {
                Some(model) => {
                    session.apply(Trigger::ChooseLimitModel(model))?;
                    self.sessions.save(&session).await?;
                    let current = self.admin_store.generation_limit(model);
                    self.transport.remove_keyboard(chat_id, &enter_limit(model, current)).await
                }
                None => {
                    self.transport
                        .send_reply_keyboard(chat_id, UNKNOWN_LIMIT_MODEL, &model_label_rows())
                        .await
                }
            },
            AdminFlowId::SetLimit(model) => {
                let Some(limit) = parse_limit(text) else {
                    return self.transport.send_text(chat_id, INVALID_LIMIT).await;
                };

                self.admin_store.set_generation_limit(model, limit)?;
                log_admin_action(admin_id, "set_limit", Some(model.quota_key()), Some(&limit.to_string()));

                session.apply(Trigger::AdminInputApplied)?;
                self.sessions.save(&session).await?;
                self.transport.send_text(chat_id, &limit_updated(model, limit)).await
            }
        }
    }

    async fn admin_menu_choice(&self, event: &InboundEvent, mut session: UserSession, text: &str) -> Result<()> {
        let chat_id = event.chat_id;
        let Some(choice) = AdminMenuChoice::from_label(text) else {
            return self.show_admin_menu(chat_id, ADMIN_MENU_HINT).await;
        };

        session.apply(Trigger::AdminMenu(choice))?;
        self.sessions.save(&session).await?;

        match choice {
            AdminMenuChoice::AddAdmin => self.transport.remove_keyboard(chat_id, ENTER_ADMIN_TO_ADD).await,
            AdminMenuChoice::RemoveAdmin => self.transport.remove_keyboard(chat_id, ENTER_ADMIN_TO_REMOVE).await,
            AdminMenuChoice::SetLimit => {
                self.transport
                    .send_reply_keyboard(chat_id, CHOOSE_LIMIT_MODEL, &model_label_rows())
                    .await
            }
            AdminMenuChoice::MaintenanceOn | AdminMenuChoice::MaintenanceOff => {
                let enabled = choice == AdminMenuChoice::MaintenanceOn;
                self.admin_store.set_maintenance_mode(enabled);
                log_admin_action(event.user_id, "set_maintenance", None, Some(if enabled { "on" } else { "off" }));
                self.show_admin_menu(chat_id, if enabled { MAINTENANCE_ENABLED } else { MAINTENANCE_DISABLED })
                    .await
            }
            AdminMenuChoice::ShowLimits => {
                let overview = limits_overview(&self.admin_store.generation_limits());
                self.show_admin_menu(chat_id, &overview).await
            }
            AdminMenuChoice::Exit => self.transport.remove_keyboard(chat_id, ADMIN_EXIT).await,
        }
    }
}
