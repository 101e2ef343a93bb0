//! Scripted provider gateway

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;

use PromptRelay::models::{GenerationResult, ImagePayload, ModelKey};
use PromptRelay::providers::ProviderGateway;

/// Replays queued results, then falls back to a per-kind default.
/// Every call is recorded.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    script: Arc<Mutex<VecDeque<GenerationResult>>>,
    calls: Arc<Mutex<Vec<(ModelKey, String, i64)>>>,
    delay: Arc<Mutex<Duration>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: GenerationResult) {
        self.script.lock().unwrap().push_back(result);
    }

    /// Simulated provider latency
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, model: ModelKey) -> usize {
        self.calls.lock().unwrap().iter().filter(|(m, _, _)| *m == model).count()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.calls.lock().unwrap().last().map(|(_, prompt, _)| prompt.clone())
    }
}

#[async_trait]
impl ProviderGateway for ScriptedGateway {
    async fn generate(&self, model: ModelKey, prompt: &str, user_id: i64) -> GenerationResult {
        self.calls.lock().unwrap().push((model, prompt.to_string(), user_id));

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            if model.is_image() {
                GenerationResult::Image(ImagePayload::Url("https://images.example.com/cat.png".to_string()))
            } else {
                GenerationResult::Text(format!("answer to {}", prompt))
            }
        })
    }
}
