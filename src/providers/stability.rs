//! Stability AI text-to-image adapter

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde_json::json;

use crate::config::ProviderEndpoint;
use crate::models::{FailureKind, GenerationResult, ImagePayload, ModelKey};
use super::http::{endpoint_url, post_json, required_text};
use super::GenerationAdapter;

pub struct StabilityAdapter {
    client: Client,
    endpoint: ProviderEndpoint,
}

impl StabilityAdapter {
    pub fn new(client: Client, endpoint: ProviderEndpoint) -> Self {
        Self { client, endpoint }
    }

    async fn call(&self, prompt: &str) -> Result<ImagePayload, FailureKind> {
        let path = format!("v1/generation/{}/text-to-image", self.endpoint.model);
        let url = endpoint_url(&self.endpoint.base_url, &path);
        let body = json!({
            "text_prompts": [{ "text": prompt }],
            "cfg_scale": 7,
            "height": 512,
            "width": 512,
            "steps": 30,
            "samples": 1,
        });

        let response = post_json(&self.client, &url, &self.endpoint.api_key, &body).await?;
        let encoded = required_text(&response, "/artifacts/0/base64")?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| FailureKind::Malformed(format!("invalid base64 artifact: {}", e)))?;

        Ok(ImagePayload::Bytes(bytes))
    }
}

#[async_trait]
impl GenerationAdapter for StabilityAdapter {
    fn model(&self) -> ModelKey {
        ModelKey::StableDiffusion
    }

    async fn generate(&self, prompt: &str) -> GenerationResult {
        match self.call(prompt).await {
            Ok(image) => GenerationResult::Image(image),
            Err(kind) => kind.into(),
        }
    }
}
