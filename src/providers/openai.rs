//! OpenAI-compatible chat and image adapters
//!
//! Used for ChatGPT and DALL·E through proxyapi, and for Mistral through
//! aimlapi, which speaks the same chat-completions protocol.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::ProviderEndpoint;
use crate::models::{FailureKind, GenerationResult, ImagePayload, ModelKey};
use super::http::{endpoint_url, post_json, required_text};
use super::GenerationAdapter;

/// Tunables of one chat-completions model
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub system_prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn chat_gpt() -> Self {
        Self {
            system_prompt: "You are a helpful assistant.".to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn mistral() -> Self {
        Self {
            system_prompt: "You are a helpful assistant.".to_string(),
            temperature: Some(0.7),
            max_tokens: Some(256),
        }
    }
}

pub struct ChatCompletionsAdapter {
    client: Client,
    endpoint: ProviderEndpoint,
    model: ModelKey,
    options: ChatOptions,
}

impl ChatCompletionsAdapter {
    pub fn new(client: Client, endpoint: ProviderEndpoint, model: ModelKey, options: ChatOptions) -> Self {
        Self { client, endpoint, model, options }
    }

    fn body(&self, prompt: &str) -> Value {
        let mut body = json!({
            "model": self.endpoint.model,
            "messages": [
                { "role": "system", "content": self.options.system_prompt },
                { "role": "user", "content": prompt },
            ],
            "stream": false,
        });
        if let Some(temperature) = self.options.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = self.options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }

    async fn call(&self, prompt: &str) -> Result<String, FailureKind> {
        let url = endpoint_url(&self.endpoint.base_url, "chat/completions");
        let response = post_json(&self.client, &url, &self.endpoint.api_key, &self.body(prompt)).await?;
        required_text(&response, "/choices/0/message/content")
    }
}

#[async_trait]
impl GenerationAdapter for ChatCompletionsAdapter {
    fn model(&self) -> ModelKey {
        self.model
    }

    async fn generate(&self, prompt: &str) -> GenerationResult {
        match self.call(prompt).await {
            Ok(text) => GenerationResult::Text(text),
            Err(kind) => kind.into(),
        }
    }
}

/// DALL·E image generation, returns a hosted image URL
pub struct ImageGenerationsAdapter {
    client: Client,
    endpoint: ProviderEndpoint,
}

impl ImageGenerationsAdapter {
    pub fn new(client: Client, endpoint: ProviderEndpoint) -> Self {
        Self { client, endpoint }
    }

    async fn call(&self, prompt: &str) -> Result<ImagePayload, FailureKind> {
        let url = endpoint_url(&self.endpoint.base_url, "images/generations");
        let body = json!({
            "model": self.endpoint.model,
            "prompt": prompt,
            "n": 1,
            "size": "1024x1024",
        });

        let response = post_json(&self.client, &url, &self.endpoint.api_key, &body).await?;
        let image_url = required_text(&response, "/data/0/url")?;
        url::Url::parse(&image_url)
            .map_err(|e| FailureKind::Malformed(format!("invalid image url: {}", e)))?;

        Ok(ImagePayload::Url(image_url))
    }
}

#[async_trait]
impl GenerationAdapter for ImageGenerationsAdapter {
    fn model(&self) -> ModelKey {
        ModelKey::Dalle
    }

    async fn generate(&self, prompt: &str) -> GenerationResult {
        match self.call(prompt).await {
            Ok(image) => GenerationResult::Image(image),
            Err(kind) => kind.into(),
        }
    }
}
