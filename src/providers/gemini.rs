//! Google Gemini adapter (generateContent)

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::config::ProviderEndpoint;
use crate::models::{FailureKind, GenerationResult, ModelKey};
use super::http::{endpoint_url, post_json, required_text};
use super::GenerationAdapter;

const HELPER_PROMPT: &str = "You are a helpful assistant.";

pub struct GeminiAdapter {
    client: Client,
    endpoint: ProviderEndpoint,
}

impl GeminiAdapter {
    pub fn new(client: Client, endpoint: ProviderEndpoint) -> Self {
        Self { client, endpoint }
    }

    async fn call(&self, prompt: &str) -> Result<String, FailureKind> {
        let path = format!("models/{}:generateContent", self.endpoint.model);
        let url = endpoint_url(&self.endpoint.base_url, &path);
        let body = json!({
            "contents": [
                { "role": "user", "parts": [{ "text": HELPER_PROMPT }] },
                { "role": "user", "parts": [{ "text": prompt }] },
            ],
        });

        let response = post_json(&self.client, &url, &self.endpoint.api_key, &body).await?;
        required_text(&response, "/candidates/0/content/parts/0/text")
    }
}

#[async_trait]
impl GenerationAdapter for GeminiAdapter {
    fn model(&self) -> ModelKey {
        ModelKey::Gemini
    }

    async fn generate(&self, prompt: &str) -> GenerationResult {
        match self.call(prompt).await {
            Ok(text) => GenerationResult::Text(text),
            Err(kind) => kind.into(),
        }
    }
}
