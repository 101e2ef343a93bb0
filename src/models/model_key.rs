//! Supported generation models
//!
//! The set is closed: adding a model means adding a quota default, a gateway
//! adapter and a menu entry.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::utils::errors::RelayError;

/// Output kind a model produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    Text,
    Image,
}

/// Identifier of one supported generation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKey {
    #[serde(rename = "chatGpt")]
    ChatGpt,
    #[serde(rename = "stableDiffusion")]
    StableDiffusion,
    #[serde(rename = "mistralai")]
    Mistral,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "dalle")]
    Dalle,
    #[serde(rename = "claude")]
    Claude,
}

impl ModelKey {
    /// All models in menu order
    pub const ALL: [ModelKey; 6] = [
        ModelKey::ChatGpt,
        ModelKey::StableDiffusion,
        ModelKey::Mistral,
        ModelKey::Gemini,
        ModelKey::Dalle,
        ModelKey::Claude,
    ];

    /// Key used in the persisted `generationLimits` object
    pub fn quota_key(&self) -> &'static str {
        match self {
            ModelKey::ChatGpt => "chatGpt",
            ModelKey::StableDiffusion => "stableDiffusion",
            ModelKey::Mistral => "mistralai",
            ModelKey::Gemini => "gemini",
            ModelKey::Dalle => "dalle",
            ModelKey::Claude => "claude",
        }
    }

    /// Button label shown in menus
    pub fn label(&self) -> &'static str {
        match self {
            ModelKey::ChatGpt => "Chat-GPT",
            ModelKey::StableDiffusion => "Stable Diffusion",
            ModelKey::Mistral => "Mistralai",
            ModelKey::Gemini => "Gemini 1.5 flash",
            ModelKey::Dalle => "DALL·E",
            ModelKey::Claude => "Claude",
        }
    }

    /// Slug carried in callback data (`model:<slug>`)
    pub fn slug(&self) -> &'static str {
        match self {
            ModelKey::ChatGpt => "Chat-GPT",
            ModelKey::StableDiffusion => "Stable-Diffusion",
            ModelKey::Mistral => "Mistralai",
            ModelKey::Gemini => "Gemini-1.5-flash",
            ModelKey::Dalle => "DALL-E",
            ModelKey::Claude => "Claude",
        }
    }

    /// Name used in the scene entry message
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKey::ChatGpt => "Chat-GPT (GPT-4o-mini)",
            ModelKey::StableDiffusion => "Stable Diffusion",
            ModelKey::Mistral => "Mistralai",
            ModelKey::Gemini => "Gemini 1.5 flash",
            ModelKey::Dalle => "DALL·E",
            ModelKey::Claude => "Claude",
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            ModelKey::StableDiffusion | ModelKey::Dalle => ModelKind::Image,
            _ => ModelKind::Text,
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind() == ModelKind::Image
    }

    /// Callback data for the model selection keyboard
    pub fn callback_data(&self) -> String {
        format!("model:{}", self.slug())
    }

    pub fn from_quota_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.quota_key() == key)
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.slug() == slug)
    }

    /// Match a free-text button label, ignoring case and surrounding whitespace
    pub fn from_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.label().eq_ignore_ascii_case(text))
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.quota_key())
    }
}

impl FromStr for ModelKey {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_quota_key(s).ok_or_else(|| RelayError::UnknownModel(s.to_string()))
    }
}
