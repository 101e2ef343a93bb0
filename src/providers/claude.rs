//! Anthropic Claude adapter (messages API)

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::config::ProviderEndpoint;
use crate::models::{FailureKind, GenerationResult, ModelKey};
use crate::utils::markup::unescape_markdown;
use super::http::{endpoint_url, post_json, required_text};
use super::GenerationAdapter;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Write in Markdown format, but do not escape characters like #, -, *, etc.";
const MAX_TOKENS: u32 = 710;

pub struct ClaudeAdapter {
    client: Client,
    endpoint: ProviderEndpoint,
}

impl ClaudeAdapter {
    pub fn new(client: Client, endpoint: ProviderEndpoint) -> Self {
        Self { client, endpoint }
    }

    async fn call(&self, prompt: &str) -> Result<String, FailureKind> {
        let url = endpoint_url(&self.endpoint.base_url, "messages");
        let body = json!({
            "model": self.endpoint.model,
            "system": SYSTEM_PROMPT,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": MAX_TOKENS,
        });

        let response = post_json(&self.client, &url, &self.endpoint.api_key, &body).await?;
        let text = required_text(&response, "/content/0/text")?;

        // Claude escapes markup despite the system prompt
        Ok(unescape_markdown(&text))
    }
}

#[async_trait]
impl GenerationAdapter for ClaudeAdapter {
    fn model(&self) -> ModelKey {
        ModelKey::Claude
    }

    async fn generate(&self, prompt: &str) -> GenerationResult {
        match self.call(prompt).await {
            Ok(text) => GenerationResult::Text(text),
            Err(kind) => kind.into(),
        }
    }
}
