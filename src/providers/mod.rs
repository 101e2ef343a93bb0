//! Provider gateway
//!
//! One uniform `generate` call over six HTTP adapters. Adapters never return
//! errors: every failure is classified into a [`FailureKind`] so the
//! controller can treat all providers alike.

pub mod claude;
pub mod gemini;
pub mod http;
pub mod openai;
pub mod stability;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use async_trait::async_trait;
use reqwest::Client;

use crate::config::{ProvidersConfig, ProxyConfig};
use crate::middleware::logging::LoggingMiddleware;
use crate::models::{FailureKind, GenerationResult, ModelKey};
use crate::utils::diagnostics::{Diagnostic, SharedSink};
use crate::utils::errors::Result;

pub use claude::ClaudeAdapter;
pub use gemini::GeminiAdapter;
pub use openai::{ChatCompletionsAdapter, ChatOptions, ImageGenerationsAdapter};
pub use stability::StabilityAdapter;

/// A single provider integration
#[async_trait]
pub trait GenerationAdapter: Send + Sync {
    fn model(&self) -> ModelKey;

    async fn generate(&self, prompt: &str) -> GenerationResult;
}

#[async_trait]
pub trait ProviderGateway: Send + Sync {
    async fn generate(&self, model: ModelKey, prompt: &str, user_id: i64) -> GenerationResult;
}

/// Routes each model to its adapter over one shared HTTP client
pub struct HttpGateway {
    adapters: HashMap<ModelKey, Arc<dyn GenerationAdapter>>,
    sink: SharedSink,
    logging: LoggingMiddleware,
}

impl HttpGateway {
    /// Empty gateway; add adapters with [`HttpGateway::with_adapter`]
    pub fn new(sink: SharedSink) -> Self {
        Self {
            adapters: HashMap::new(),
            sink,
            logging: LoggingMiddleware::default(),
        }
    }

    /// Production gateway: all adapters, egress through the SOCKS5 proxy
    pub fn from_settings(providers: &ProvidersConfig, proxy: &ProxyConfig, sink: SharedSink) -> Result<Self> {
        let client = http::build_client(Some(proxy), Duration::from_secs(providers.timeout_seconds))?;
        Ok(Self::with_client(client, providers, sink))
    }

    /// All six adapters over the given client
    pub fn with_client(client: Client, providers: &ProvidersConfig, sink: SharedSink) -> Self {
        Self::new(sink)
            .with_adapter(ChatCompletionsAdapter::new(
                client.clone(),
                providers.openai.clone(),
                ModelKey::ChatGpt,
                ChatOptions::chat_gpt(),
            ))
            .with_adapter(ChatCompletionsAdapter::new(
                client.clone(),
                providers.mistral.clone(),
                ModelKey::Mistral,
                ChatOptions::mistral(),
            ))
            .with_adapter(GeminiAdapter::new(client.clone(), providers.gemini.clone()))
            .with_adapter(ClaudeAdapter::new(client.clone(), providers.claude.clone()))
            .with_adapter(ImageGenerationsAdapter::new(client.clone(), providers.dalle.clone()))
            .with_adapter(StabilityAdapter::new(client, providers.stability.clone()))
    }

    pub fn with_adapter(mut self, adapter: impl GenerationAdapter + 'static) -> Self {
        self.adapters.insert(adapter.model(), Arc::new(adapter));
        self
    }

    pub fn supports(&self, model: ModelKey) -> bool {
        self.adapters.contains_key(&model)
    }
}

#[async_trait]
impl ProviderGateway for HttpGateway {
    async fn generate(&self, model: ModelKey, prompt: &str, user_id: i64) -> GenerationResult {
        let Some(adapter) = self.adapters.get(&model) else {
            let kind = FailureKind::Upstream(format!("no adapter configured for {}", model));
            self.sink.report(Diagnostic::error("gateway", kind.to_string()).for_user(user_id));
            return kind.into();
        };

        let started = Instant::now();
        let result = adapter.generate(prompt).await;
        let elapsed = started.elapsed();

        self.logging.log_provider_call(model, elapsed, !result.is_failure());
        if let GenerationResult::Failure(kind) = &result {
            self.sink.report(
                Diagnostic::error("gateway", format!("{} failed: {}", model, kind)).for_user(user_id),
            );
        }

        result
    }
}
