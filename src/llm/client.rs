//! HTTP client for OpenAI-compatible chat-completion gateways

use super::{ChatMessage, ChatModel, CompletionRequest};
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Configuration for an LLM API provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL for the API (e.g., "https://api.groq.com/openai/v1")
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Extra headers to include in requests (e.g., X-Title, HTTP-Referer)
    pub extra_headers: Vec<(String, String)>,
}

impl ProviderConfig {
    /// Groq, the gateway the front-end talks to by default
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self {
            base_url: GROQ_BASE_URL.to_string(),
            api_key: api_key.into(),
            extra_headers: Vec::new(),
        }
    }

    /// OpenRouter, which wants attribution headers
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self {
            base_url: OPENROUTER_BASE_URL.to_string(),
            api_key: api_key.into(),
            extra_headers: vec![
                ("HTTP-Referer".to_string(), "https://github.com/startup-box".to_string()),
                ("X-Title".to_string(), "Startup Box".to_string()),
            ],
        }
    }

    /// Any other OpenAI-compatible endpoint
    pub fn custom(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            extra_headers: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

/// LLM gateway client
#[derive(Clone)]
pub struct GatewayClient {
    client: Arc<Client>,
    provider: ProviderConfig,
}

impl GatewayClient {
    /// Create a client. An empty API key is rejected up front.
    pub fn new(provider: ProviderConfig) -> Result<Self, LlmError> {
        Self::build(provider, None)
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(provider: ProviderConfig, timeout: Duration) -> Result<Self, LlmError> {
        Self::build(provider, Some(timeout))
    }

    fn build(provider: ProviderConfig, timeout: Option<Duration>) -> Result<Self, LlmError> {
        if provider.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: Arc::new(builder.build()?),
            provider,
        })
    }

    /// Send a chat completion request
    pub async fn chat(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            "LLM request: model={} messages={} max_tokens={}",
            request.model,
            request.messages.len(),
            request.max_tokens
        );

        let mut req_builder = self.client
            .post(format!("{}/chat/completions", self.provider.base_url))
            .bearer_auth(&self.provider.api_key);
        for (key, value) in &self.provider.extra_headers {
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }
        let response = req_builder.json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: crate::truncate_safe(&body, 500).to_string(),
            });
        }

        let body = response.text().await?;
        let raw: Value = serde_json::from_str(body.trim()).map_err(|e| {
            LlmError::Decode(format!("{} (body: {})", e, crate::truncate_safe(&body, 200)))
        })?;

        Ok(extract_content(&raw))
    }
}

#[async_trait]
impl ChatModel for GatewayClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.chat(&request).await
    }
}

/// Pull `choices[0].message.content` out of a completion response.
///
/// Content may be a plain string or an array of `{"type":"text"}` parts;
/// anything else reads as empty.
pub fn extract_content(raw: &Value) -> String {
    let content = raw
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"));

    match content {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_api_key_rejected() {
        let result = GatewayClient::new(ProviderConfig::groq("   "));
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }

    #[test]
    fn test_custom_provider_trims_trailing_slash() {
        let provider = ProviderConfig::custom("http://localhost:9000/v1/", "k");
        assert_eq!(provider.base_url, "http://localhost:9000/v1");
    }

    #[test]
    fn test_extract_string_content() {
        let raw = json!({"choices": [{"message": {"role": "assistant", "content": "INTENT: x"}}]});
        assert_eq!(extract_content(&raw), "INTENT: x");
    }

    #[test]
    fn test_extract_array_content() {
        let raw = json!({"choices": [{"message": {"content": [
            {"type": "text", "text": "1. a\n"},
            {"type": "image_url", "image_url": {"url": "x"}},
            {"type": "text", "text": "2. b"}
        ]}}]});
        assert_eq!(extract_content(&raw), "1. a\n2. b");
    }

    #[test]
    fn test_extract_missing_content_is_empty() {
        assert_eq!(extract_content(&json!({"choices": []})), "");
        assert_eq!(extract_content(&json!({"error": "nope"})), "");
        assert_eq!(extract_content(&json!({"choices": [{"message": {"content": null}}]})), "");
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let body = ChatRequest { model: "m", messages: &messages, temperature: 0.5, max_tokens: 400 };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "m");
        assert_eq!(value["max_tokens"], 400);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "u");
    }
}
