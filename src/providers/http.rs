//! Shared HTTP plumbing for provider adapters

use std::time::Duration;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::ProxyConfig;
use crate::models::FailureKind;
use crate::utils::errors::Result;
use crate::utils::helpers::truncate_text;

/// Build the client every adapter shares.
///
/// With a proxy, all egress goes through `socks5h://` so DNS also resolves
/// on the proxy side.
pub fn build_client(proxy: Option<&ProxyConfig>, timeout: Duration) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("PromptRelay/", env!("CARGO_PKG_VERSION")));

    if let Some(proxy) = proxy {
        let url = proxy.to_url()?;
        builder = builder.proxy(reqwest::Proxy::all(url.as_str())?);
    }

    Ok(builder.build()?)
}

/// Join a base URL and an endpoint path
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// POST a JSON body with bearer auth and return the parsed JSON response.
pub async fn post_json(
    client: &Client,
    url: &str,
    api_key: &str,
    body: &Value,
) -> std::result::Result<Value, FailureKind> {
    debug!(url = %url, "Calling provider");

    let response = client
        .post(url)
        .bearer_auth(api_key)
        .header(header::ACCEPT, "application/json")
        .json(body)
        .send()
        .await
        .map_err(map_transport_error)?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_seconds = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        return Err(FailureKind::RateLimited { retry_after_seconds });
    }

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(FailureKind::Upstream(format!(
            "HTTP {}: {}",
            status.as_u16(),
            error_message(&error_text)
        )));
    }

    response.json::<Value>().await.map_err(|e| {
        if e.is_timeout() {
            FailureKind::Timeout
        } else {
            FailureKind::Malformed(format!("invalid JSON body: {}", e))
        }
    })
}

fn map_transport_error(e: reqwest::Error) -> FailureKind {
    if e.is_timeout() {
        FailureKind::Timeout
    } else if e.is_connect() {
        FailureKind::Upstream(format!("connection failed: {}", e))
    } else {
        FailureKind::Upstream(e.to_string())
    }
}

/// Pull a human readable message out of an error body
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        v["error"]["message"]
            .as_str()
            .or_else(|| v["message"].as_str())
            .or_else(|| v["error"].as_str())
            .or_else(|| v["name"].as_str())
            .map(str::to_string)
    });

    match message {
        Some(message) => message,
        None if body.trim().is_empty() => "no response body".to_string(),
        None => truncate_text(body.trim(), 200),
    }
}

/// Extract a non-empty string at a JSON pointer, or `Malformed`
pub fn required_text(value: &Value, pointer: &str) -> std::result::Result<String, FailureKind> {
    match value.pointer(pointer).and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        Some(_) => Err(FailureKind::Malformed(format!("empty content at {}", pointer))),
        None => Err(FailureKind::Malformed(format!("missing field {}", pointer))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_url() {
        assert_eq!(endpoint_url("https://a.b/v1/", "/chat/completions"), "https://a.b/v1/chat/completions");
        assert_eq!(endpoint_url("https://a.b/v1", "messages"), "https://a.b/v1/messages");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"error":{"message":"bad key"}}"#), "bad key");
        assert_eq!(error_message(r#"{"message":"quota"}"#), "quota");
        assert_eq!(error_message(r#"{"error":"nope"}"#), "nope");
        assert_eq!(error_message(""), "no response body");
        assert_eq!(error_message("gateway down"), "gateway down");
    }

    #[test]
    fn test_required_text() {
        let value = json!({"choices": [{"message": {"content": "hi"}}]});
        assert_eq!(required_text(&value, "/choices/0/message/content").unwrap(), "hi");

        let empty = json!({"choices": [{"message": {"content": "  "}}]});
        assert!(matches!(required_text(&empty, "/choices/0/message/content"), Err(FailureKind::Malformed(_))));
        assert!(matches!(required_text(&json!({}), "/choices/0/message/content"), Err(FailureKind::Malformed(_))));
    }

    #[test]
    fn test_build_client_with_proxy() {
        let proxy = ProxyConfig {
            host: "127.0.0.1".to_string(),
            port: 1080,
            username: "u".to_string(),
            password: "p".to_string(),
        };
        assert!(build_client(Some(&proxy), Duration::from_secs(5)).is_ok());
        assert!(build_client(None, Duration::from_secs(5)).is_ok());
    }
}
