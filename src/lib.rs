//! Startup Box - Task Orchestration Library
//!
//! Routes a founder's free-form request to specialist agents:
//! - Intent classification and task decomposition through an
//!   OpenAI-compatible LLM gateway
//! - Sequential dispatch to market-analyst, branding, content and
//!   outreach agents, hosted remotely or run against the gateway
//! - Session state with credits, activity feed and shared context
//! - Knowledge base writes and decision feedback through the hosted functions
//!
//! # Example
//!
//! ```ignore
//! use startup_box::{Config, Orchestrator, SessionContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let orchestrator = Orchestrator::from_config(&config, &startup_box::get_api_key()?, None)?;
//!     let mut session = SessionContext::default();
//!     let report = orchestrator.run(&mut session, "Help me price my SaaS", &|_, _| {}).await?;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod error;
pub mod llm;
pub mod agents;
pub mod config;
pub mod security;
pub mod orchestrator;
pub mod cli;

// Re-export commonly used types for convenience
pub use agents::{AgentInvoker, AgentOutput, AgentRequest, AgentTool, LlmAgentInvoker, RemoteAgentInvoker};
pub use config::Config;
pub use error::{LlmError, OrchestratorError};
pub use llm::{ChatModel, GatewayClient, ProviderConfig};
pub use orchestrator::{
    ActivityLog, AgentResult, Orchestrator, OrchestratorResult, RunReport, SessionContext, TaskAnalysis,
};
pub use security::{delete_api_key, get_api_key, set_api_key};
pub use types::{ActivityStatus, AgentId, Complexity, ResultStatus};

/// Longest prefix of `s` that fits in `max` bytes without splitting a char
pub fn truncate_safe(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_safe() {
        assert_eq!(truncate_safe("hello", 10), "hello");
        assert_eq!(truncate_safe("hello", 3), "hel");
        // 'é' is two bytes; cutting inside it backs off
        assert_eq!(truncate_safe("café", 4), "caf");
        assert_eq!(truncate_safe("", 0), "");
    }
}
