//! Conversation state machine
//!
//! Per-user states and the pure transition table. Side effects (replies,
//! gateway calls, admin mutations) live in the controller; this module only
//! decides which state follows which.

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::models::ModelKey;
use crate::utils::errors::{RelayError, Result};

/// Step inside the admin panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminFlowId {
    Menu,
    AddAdmin,
    RemoveAdmin,
    ChooseLimitModel,
    SetLimit(ModelKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConversationState {
    #[default]
    Idle,
    SelectingModel,
    InScene(ModelKey),
    AdminFlow(AdminFlowId),
}

/// Admin menu buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminMenuChoice {
    AddAdmin,
    RemoveAdmin,
    SetLimit,
    MaintenanceOn,
    MaintenanceOff,
    ShowLimits,
    Exit,
}

impl AdminMenuChoice {
    pub const ALL: [AdminMenuChoice; 7] = [
        AdminMenuChoice::AddAdmin,
        AdminMenuChoice::RemoveAdmin,
        AdminMenuChoice::SetLimit,
        AdminMenuChoice::MaintenanceOn,
        AdminMenuChoice::MaintenanceOff,
        AdminMenuChoice::ShowLimits,
        AdminMenuChoice::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AdminMenuChoice::AddAdmin => "Add admin",
            AdminMenuChoice::RemoveAdmin => "Remove admin",
            AdminMenuChoice::SetLimit => "Set limit",
            AdminMenuChoice::MaintenanceOn => "Maintenance on",
            AdminMenuChoice::MaintenanceOff => "Maintenance off",
            AdminMenuChoice::ShowLimits => "Show limits",
            AdminMenuChoice::Exit => "Exit admin",
        }
    }

    pub fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .into_iter()
            .find(|choice| choice.label().eq_ignore_ascii_case(text))
    }
}

/// Input that may move a user between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// `/start` after the subscription gate resolved
    Start { subscribed: bool },
    ChooseModel(ModelKey),
    EndDialog,
    GenerationFailed,
    OpenAdmin,
    AdminMenu(AdminMenuChoice),
    ChooseLimitModel(ModelKey),
    AdminInputApplied,
    AdminRevoked,
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationState::Idle => write!(f, "idle"),
            ConversationState::SelectingModel => write!(f, "selecting_model"),
            ConversationState::InScene(model) => write!(f, "scene:{}", model),
            ConversationState::AdminFlow(step) => write!(f, "admin:{:?}", step),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::ChooseModel(model) => write!(f, "choose:{}", model),
            Trigger::ChooseLimitModel(model) => write!(f, "limit_model:{}", model),
            other => write!(f, "{:?}", other),
        }
    }
}

impl ConversationState {
    pub fn scene(&self) -> Option<ModelKey> {
        match self {
            ConversationState::InScene(model) => Some(*model),
            _ => None,
        }
    }
}

/// Compute the next state; illegal pairs are `InvalidStateTransition`
pub fn transition(state: ConversationState, trigger: Trigger) -> Result<ConversationState> {
    use AdminFlowId as A;
    use ConversationState as S;

    let next = match (state, trigger) {
        (_, Trigger::Start { subscribed: true }) => S::SelectingModel,
        (_, Trigger::Start { subscribed: false }) => S::Idle,
        (_, Trigger::OpenAdmin) => S::AdminFlow(A::Menu),

        (S::SelectingModel, Trigger::ChooseModel(model)) => S::InScene(model),
        (S::InScene(_), Trigger::EndDialog) => S::SelectingModel,
        (S::InScene(_), Trigger::GenerationFailed) => S::SelectingModel,

        (S::AdminFlow(A::Menu), Trigger::AdminMenu(choice)) => match choice {
            AdminMenuChoice::AddAdmin => S::AdminFlow(A::AddAdmin),
            AdminMenuChoice::RemoveAdmin => S::AdminFlow(A::RemoveAdmin),
            AdminMenuChoice::SetLimit => S::AdminFlow(A::ChooseLimitModel),
            AdminMenuChoice::MaintenanceOn
            | AdminMenuChoice::MaintenanceOff
            | AdminMenuChoice::ShowLimits => S::AdminFlow(A::Menu),
            AdminMenuChoice::Exit => S::Idle,
        },
        (S::AdminFlow(A::ChooseLimitModel), Trigger::ChooseLimitModel(model)) => {
            S::AdminFlow(A::SetLimit(model))
        }
        (S::AdminFlow(A::AddAdmin | A::RemoveAdmin | A::SetLimit(_)), Trigger::AdminInputApplied) => S::Idle,
        (S::AdminFlow(_), Trigger::AdminRevoked) => S::Idle,

        (from, to) => {
            return Err(RelayError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_start_from_any_state() {
        let states = [
            ConversationState::Idle,
            ConversationState::SelectingModel,
            ConversationState::InScene(ModelKey::Claude),
            ConversationState::AdminFlow(AdminFlowId::SetLimit(ModelKey::Dalle)),
        ];
        for state in states {
            assert_eq!(
                transition(state, Trigger::Start { subscribed: true }).unwrap(),
                ConversationState::SelectingModel
            );
            assert_eq!(
                transition(state, Trigger::Start { subscribed: false }).unwrap(),
                ConversationState::Idle
            );
        }
    }

    #[test]
    fn test_every_model_enters_scene_and_returns() {
        for model in ModelKey::ALL {
            let scene = transition(ConversationState::SelectingModel, Trigger::ChooseModel(model)).unwrap();
            assert_eq!(scene, ConversationState::InScene(model));
            assert_eq!(scene.scene(), Some(model));
            assert_eq!(
                transition(scene, Trigger::EndDialog).unwrap(),
                ConversationState::SelectingModel
            );
        }
    }

    #[test]
    fn test_failure_returns_to_menu() {
        let scene = ConversationState::InScene(ModelKey::Gemini);
        assert_eq!(
            transition(scene, Trigger::GenerationFailed).unwrap(),
            ConversationState::SelectingModel
        );
    }

    #[test]
    fn test_illegal_transitions() {
        assert_matches!(
            transition(ConversationState::Idle, Trigger::ChooseModel(ModelKey::ChatGpt)),
            Err(RelayError::InvalidStateTransition { .. })
        );
        assert_matches!(
            transition(ConversationState::SelectingModel, Trigger::EndDialog),
            Err(RelayError::InvalidStateTransition { .. })
        );
        assert_matches!(
            transition(ConversationState::Idle, Trigger::AdminInputApplied),
            Err(RelayError::InvalidStateTransition { .. })
        );
    }

    #[test]
    fn test_admin_flow() {
        let menu = transition(ConversationState::Idle, Trigger::OpenAdmin).unwrap();
        assert_eq!(menu, ConversationState::AdminFlow(AdminFlowId::Menu));

        let stays = transition(menu, Trigger::AdminMenu(AdminMenuChoice::MaintenanceOn)).unwrap();
        assert_eq!(stays, menu);

        let choose = transition(menu, Trigger::AdminMenu(AdminMenuChoice::SetLimit)).unwrap();
        let set = transition(choose, Trigger::ChooseLimitModel(ModelKey::Mistral)).unwrap();
        assert_eq!(set, ConversationState::AdminFlow(AdminFlowId::SetLimit(ModelKey::Mistral)));
        assert_eq!(transition(set, Trigger::AdminInputApplied).unwrap(), ConversationState::Idle);

        assert_eq!(
            transition(menu, Trigger::AdminMenu(AdminMenuChoice::Exit)).unwrap(),
            ConversationState::Idle
        );
        assert_eq!(transition(choose, Trigger::AdminRevoked).unwrap(), ConversationState::Idle);
    }

    #[test]
    fn test_admin_menu_labels() {
        assert_eq!(AdminMenuChoice::from_label("show limits"), Some(AdminMenuChoice::ShowLimits));
        assert_eq!(AdminMenuChoice::from_label("Exit admin"), Some(AdminMenuChoice::Exit));
        assert_eq!(AdminMenuChoice::from_label("Reboot"), None);
    }

    #[test]
    fn test_state_serializes() {
        let state = ConversationState::AdminFlow(AdminFlowId::SetLimit(ModelKey::StableDiffusion));
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(serde_json::from_str::<ConversationState>(&json).unwrap(), state);
    }
}
