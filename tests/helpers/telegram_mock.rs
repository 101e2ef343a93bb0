//! Mock Telegram API Server for testing
//!
//! Simulates the Bot API with wiremock so [`TelegramTransport`] can be
//! exercised end to end, including `429 Too Many Requests` replies.
//!
//! [`TelegramTransport`]: PromptRelay::delivery::TelegramTransport

use serde_json::{json, Value};
use teloxide::Bot;
use wiremock::{
    matchers::{method, path_regex},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_TOKEN: &str = "12345:test_token";

/// Mock Telegram API server for testing
pub struct TelegramMockServer {
    pub server: MockServer,
}

impl TelegramMockServer {
    pub async fn new() -> Self {
        Self { server: MockServer::start().await }
    }

    /// Bot pointed at the mock server
    pub fn bot(&self) -> Bot {
        let url = url::Url::parse(&self.server.uri()).unwrap();
        Bot::new(TEST_TOKEN).set_api_url(url)
    }

    fn method_path(api_method: &str) -> String {
        format!("(?i)^/bot{}/{}$", regex_escape(TEST_TOKEN), api_method)
    }

    /// `sendMessage` succeeds
    pub async fn mock_send_message(&self) {
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path("sendMessage")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": sample_message(),
            })))
            .mount(&self.server)
            .await;
    }

    /// The next `times` calls to `api_method` are rejected with `retry_after`
    pub async fn mock_rate_limited(&self, api_method: &str, retry_after: u64, times: u64) {
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path(api_method)))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "ok": false,
                "error_code": 429,
                "description": format!("Too Many Requests: retry after {}", retry_after),
                "parameters": { "retry_after": retry_after },
            })))
            .up_to_n_times(times)
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Number of requests received for a Bot API method
    pub async fn request_count(&self, api_method: &str) -> usize {
        let suffix = format!("/{}", api_method.to_lowercase());
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| req.url.path().to_lowercase().ends_with(&suffix))
            .count()
    }

    /// Bodies of all `sendMessage` calls, in order
    pub async fn sent_texts(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| req.url.path().to_lowercase().ends_with("/sendmessage"))
            .filter_map(|req| serde_json::from_slice::<Value>(&req.body).ok())
            .filter_map(|body| body["text"].as_str().map(str::to_string))
            .collect()
    }
}

fn regex_escape(text: &str) -> String {
    regex::escape(text)
}

fn sample_message() -> Value {
    json!({
        "message_id": 123,
        "from": {
            "id": 12345,
            "is_bot": true,
            "first_name": "PromptRelay",
            "username": "promptrelay_bot"
        },
        "chat": {
            "id": 42,
            "first_name": "Test",
            "type": "private"
        },
        "date": 1640995200,
        "text": "Test message"
    })
}
