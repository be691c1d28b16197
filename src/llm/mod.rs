//! LLM gateway access
//!
//! The orchestration core only ever needs single-shot chat completions:
//! one system message, one user message, one text answer back. The
//! [`ChatModel`] trait is that seam; [`GatewayClient`] is the HTTP
//! implementation for OpenAI-compatible gateways (Groq, OpenRouter, the
//! hosted app gateway).

pub mod client;

pub use client::{GatewayClient, ProviderConfig};

use crate::error::LlmError;
use crate::types::Role;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Model used for classification, decomposition and as the default recommendation
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Everything a chat completion call needs
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    /// The shape every call in this crate uses: one system + one user message
    pub fn single_turn(
        model: impl Into<String>,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            temperature: 0.7,
            max_tokens: 1024,
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A chat-completion collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Return the text of the first choice, or an empty string if the gateway sent none
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_turn_request() {
        let req = CompletionRequest::single_turn("m", "sys", "hi")
            .with_temperature(0.3)
            .with_max_tokens(500);
        assert_eq!(req.model, "m");
        assert_eq!(req.temperature, 0.3);
        assert_eq!(req.max_tokens, 500);
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.messages[1], ChatMessage::user("hi"));
    }
}
