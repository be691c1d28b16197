//! Agent dispatch table and invocation
//!
//! Each [`AgentId`] maps to a static [`AgentProfile`] (catalogue line,
//! display label, system prompt). Dispatch goes through the
//! [`AgentInvoker`] trait so the workflow executor never knows whether an
//! agent runs as a remote function or directly against the LLM gateway.

pub mod knowledge;
pub mod llm_agent;
pub mod reasoning;
pub mod remote;
pub mod tools;

pub use knowledge::{Feedback, FeedbackKind, KnowledgeEntry, SourceType, StoredKnowledge};
pub use llm_agent::LlmAgentInvoker;
pub use remote::RemoteAgentInvoker;
pub use tools::AgentTool;

use crate::error::Result;
use crate::types::AgentId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Static description of one agent
#[derive(Debug)]
pub struct AgentProfile {
    pub id: AgentId,
    /// Human-facing name
    pub label: &'static str,
    /// One-line catalogue description shown to the classifier
    pub description: &'static str,
    pub system_prompt: &'static str,
    /// Key under which this agent's latest output is shared with other agents
    pub shared_context_key: Option<&'static str>,
}

static MARKET_ANALYST: AgentProfile = AgentProfile {
    id: AgentId::MarketAnalyst,
    label: "Market Analyst",
    description: "Competitive analysis, market research, trends",
    system_prompt: "You are an expert market research analyst who provides detailed, actionable insights.",
    shared_context_key: Some("marketAnalysis"),
};

static BRANDING: AgentProfile = AgentProfile {
    id: AgentId::Branding,
    label: "Branding",
    description: "Brand identity, taglines, positioning, pitches",
    system_prompt: "You are an expert brand strategist who creates memorable brand identities, taglines and positioning.",
    shared_context_key: Some("brandIdentity"),
};

static CONTENT: AgentProfile = AgentProfile {
    id: AgentId::Content,
    label: "Content",
    description: "LinkedIn posts, blog articles, marketing content",
    system_prompt: "You are an expert content marketer who writes engaging LinkedIn posts, blog articles and marketing copy.",
    shared_context_key: None,
};

static OUTREACH: AgentProfile = AgentProfile {
    id: AgentId::Outreach,
    label: "Outreach",
    description: "Email sequences, cold outreach campaigns",
    system_prompt: "You are an expert at cold outreach who writes personalized email sequences that get replies.",
    shared_context_key: None,
};

impl AgentId {
    /// Look up this agent's entry in the dispatch table
    pub fn profile(&self) -> &'static AgentProfile {
        match self {
            AgentId::MarketAnalyst => &MARKET_ANALYST,
            AgentId::Branding => &BRANDING,
            AgentId::Content => &CONTENT,
            AgentId::Outreach => &OUTREACH,
        }
    }
}

/// The agent catalogue as embedded in the classification prompt
pub fn catalogue() -> String {
    AgentId::ALL
        .iter()
        .map(|agent| format!("- {}: {}", agent, agent.profile().description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One dispatch to one agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRequest {
    pub agent: AgentId,
    pub prompt: String,
    /// Continue an earlier conversation with this agent
    pub conversation_id: Option<String>,
    pub enabled_tools: Vec<AgentTool>,
}

impl AgentRequest {
    pub fn new(agent: AgentId, prompt: impl Into<String>) -> Self {
        Self {
            agent,
            prompt: prompt.into(),
            conversation_id: None,
            enabled_tools: AgentTool::ALL.to_vec(),
        }
    }

    pub fn with_conversation(mut self, conversation_id: Option<String>) -> Self {
        self.conversation_id = conversation_id;
        self
    }

    pub fn with_tools(mut self, tools: Vec<AgentTool>) -> Self {
        self.enabled_tools = tools;
        self
    }
}

/// What an agent hands back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub output: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Everything else the agent reported, kept opaque
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Single-attempt agent dispatch. Every failure is an `AgentInvocationFailed`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(&self, request: AgentRequest) -> Result<AgentOutput>;
}
