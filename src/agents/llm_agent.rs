//! Agents that run directly against the LLM gateway
//!
//! Used when no agent functions are deployed: the agent profile supplies
//! the system prompt, tool calls are expanded locally, and in reasoning
//! mode the structured trace is returned as metadata.

use super::reasoning::{parse_reasoning, REASONING_INSTRUCTIONS};
use super::tools::{apply_tool_calls, tools_prompt};
use super::{AgentInvoker, AgentOutput, AgentRequest};
use crate::error::{OrchestratorError, Result};
use crate::llm::{ChatModel, CompletionRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_MAX_TOKENS: u32 = 4000;

pub struct LlmAgentInvoker {
    llm: Arc<dyn ChatModel>,
    model: String,
    include_reasoning: bool,
    temperature: f32,
    max_tokens: u32,
}

impl LlmAgentInvoker {
    pub fn new(llm: Arc<dyn ChatModel>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            include_reasoning: false,
            temperature: 0.7,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Ask agents to show their reasoning under fixed headers
    pub fn with_reasoning(mut self, enabled: bool) -> Self {
        self.include_reasoning = enabled;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn system_prompt(&self, request: &AgentRequest) -> String {
        let profile = request.agent.profile();
        if self.include_reasoning {
            format!("{}\n\n{}", profile.system_prompt, REASONING_INSTRUCTIONS)
        } else {
            format!("{}\n\nProvide your output directly and concisely.", profile.system_prompt)
        }
    }
}

#[async_trait]
impl AgentInvoker for LlmAgentInvoker {
    async fn invoke(&self, request: AgentRequest) -> Result<AgentOutput> {
        let agent = request.agent;
        let user_prompt = format!("{}{}", request.prompt, tools_prompt(&request.enabled_tools));

        let completion = CompletionRequest::single_turn(&self.model, self.system_prompt(&request), user_prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let raw = self.llm.complete(completion).await.map_err(|e| {
            warn!("Agent {} LLM call failed: {}", agent, e);
            OrchestratorError::agent_failed(agent, e.to_string())
        })?;

        let (output, tool_usage) = apply_tool_calls(&raw, &request.enabled_tools);
        debug!("Agent {} produced {} chars, {} tool calls", agent, output.len(), tool_usage.len());

        let reasoning = if self.include_reasoning { parse_reasoning(&output) } else { None };

        Ok(AgentOutput {
            output,
            conversation_id: request.conversation_id,
            metadata: serde_json::json!({
                "model": self.model,
                "tool_usage": tool_usage,
                "reasoning": reasoning,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentTool;
    use crate::error::LlmError;
    use crate::llm::MockChatModel;
    use crate::types::AgentId;

    #[tokio::test]
    async fn test_invoke_uses_profile_prompt_and_expands_tools() {
        let mut llm = MockChatModel::new();
        llm.expect_complete()
            .withf(|req| {
                req.messages[0].content.starts_with("You are an expert market research analyst")
                    && req.messages[1].content.starts_with("size the market")
                    && req.messages[1].content.contains("- calculator:")
                    && req.max_tokens == 4000
            })
            .times(1)
            .returning(|_| Ok("TOOL_CALL: calculator | 12 * 1000".to_string()));

        let invoker = LlmAgentInvoker::new(Arc::new(llm), "test-model");
        let out = invoker
            .invoke(AgentRequest::new(AgentId::MarketAnalyst, "size the market").with_conversation(Some("c-9".into())))
            .await
            .unwrap();

        assert_eq!(out.output, "[Tool: calculator]\nCalculation result: 12000");
        assert_eq!(out.conversation_id.as_deref(), Some("c-9"));
        assert_eq!(out.metadata["tool_usage"][0]["tool"], "calculator");
        assert!(out.metadata["reasoning"].is_null());
    }

    #[tokio::test]
    async fn test_reasoning_mode_returns_trace() {
        let mut llm = MockChatModel::new();
        llm.expect_complete()
            .withf(|req| req.messages[0].content.contains("REASONING MODE: ENABLED") && req.max_tokens == 1500)
            .returning(|_| Ok("## Reasoning Chain\nStep 1: think\n## Confidence Score\n90%\n## Main Output\nTagline".into()));

        let invoker = LlmAgentInvoker::new(Arc::new(llm), "m")
            .with_reasoning(true)
            .with_max_tokens(1500);
        let out = invoker
            .invoke(AgentRequest::new(AgentId::Branding, "tagline").with_tools(vec![]))
            .await
            .unwrap();
        assert_eq!(out.metadata["reasoning"]["chain"][0], "Step 1: think");
        let confidence = out.metadata["reasoning"]["confidence"].as_f64().unwrap();
        assert!((confidence - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_llm_failure_maps_to_agent_failure() {
        let mut llm = MockChatModel::new();
        llm.expect_complete()
            .returning(|_| Err(LlmError::Api { status: 429, body: "rate limited".into() }));

        let invoker = LlmAgentInvoker::new(Arc::new(llm), "m");
        let err = invoker
            .invoke(AgentRequest::new(AgentId::Outreach, "emails").with_tools(vec![AgentTool::WebSearch]))
            .await
            .unwrap_err();
        match err {
            OrchestratorError::AgentInvocationFailed { agent, message } => {
                assert_eq!(agent, AgentId::Outreach);
                assert!(message.contains("429"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
