//! Error types for the orchestration core

use crate::types::AgentId;
use thiserror::Error;

/// Failures talking to the LLM gateway
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM gateway API key is required. Run 'startup-box config --set-api-key YOUR_KEY' first.")]
    MissingApiKey,

    #[error("Failed to reach LLM gateway: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM gateway error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Malformed LLM gateway response: {0}")]
    Decode(String),
}

/// Errors surfaced by the orchestration entry points
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Input required: describe what you need help with")]
    EmptyInput,

    #[error("No credits remaining")]
    OutOfCredits,

    #[error("Task analysis failed: {0}")]
    ClassificationFailed(#[source] LlmError),

    #[error("Task decomposition failed: {0}")]
    DecompositionFailed(#[source] LlmError),

    #[error("{agent} agent failed: {message}")]
    AgentInvocationFailed { agent: AgentId, message: String },

    #[error("{function} call failed: {message}")]
    FunctionFailed { function: String, message: String },
}

impl OrchestratorError {
    pub fn agent_failed(agent: AgentId, message: impl Into<String>) -> Self {
        OrchestratorError::AgentInvocationFailed {
            agent,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
