//! Workflow execution
//!
//! Dispatches the recommended agents one after another. A failing agent is
//! recorded and the run moves on; the executor itself never fails.

use super::classifier::TaskAnalysis;
use crate::agents::reasoning::main_output;
use crate::agents::{AgentInvoker, AgentRequest, AgentTool};
use crate::error::OrchestratorError;
use crate::types::{ActivityStatus, AgentId, ResultStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Progress callback: `in-progress` before each dispatch, the terminal
/// status after it
pub type ProgressFn<'a> = &'a (dyn Fn(AgentId, ActivityStatus) + Send + Sync);

/// Outcome of one agent dispatch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    pub agent: AgentId,
    /// Agent output, or the error message when the dispatch failed
    pub output: String,
    pub status: ResultStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

impl AgentResult {
    pub fn is_completed(&self) -> bool {
        self.status == ResultStatus::Completed
    }

    /// The part of the output meant for the user. When the agent returned a
    /// reasoning trace this is its `## Main Output` section.
    pub fn deliverable(&self) -> &str {
        if self.metadata.get("reasoning").is_some_and(|r| !r.is_null()) {
            main_output(&self.output)
        } else {
            &self.output
        }
    }
}

/// Analysis plus one result per recommended agent, in dispatch order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorResult {
    pub analysis: TaskAnalysis,
    pub results: Vec<AgentResult>,
}

impl OrchestratorResult {
    pub fn completed(&self) -> usize {
        self.results.iter().filter(|r| r.is_completed()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.completed()
    }
}

/// Sequential agent dispatcher
#[derive(Clone)]
pub struct WorkflowExecutor {
    invoker: Arc<dyn AgentInvoker>,
    enabled_tools: Vec<AgentTool>,
}

impl WorkflowExecutor {
    pub fn new(invoker: Arc<dyn AgentInvoker>) -> Self {
        Self {
            invoker,
            enabled_tools: AgentTool::ALL.to_vec(),
        }
    }

    /// Tools offered to every dispatched agent
    pub fn with_tools(mut self, tools: Vec<AgentTool>) -> Self {
        self.enabled_tools = tools;
        self
    }

    /// Run every recommended agent once, without conversation history
    pub async fn run(&self, user_input: &str, analysis: TaskAnalysis, on_progress: ProgressFn<'_>) -> OrchestratorResult {
        self.run_threaded(user_input, analysis, &HashMap::new(), on_progress).await
    }

    /// Run every recommended agent once, continuing each agent's earlier
    /// conversation when `conversations` has an id for it
    pub async fn run_threaded(
        &self,
        user_input: &str,
        analysis: TaskAnalysis,
        conversations: &HashMap<AgentId, String>,
        on_progress: ProgressFn<'_>,
    ) -> OrchestratorResult {
        let agents = analysis.recommended_agents.clone();
        info!("Executing workflow with {} agents", agents.len());

        let mut results = Vec::with_capacity(agents.len());

        for (index, agent) in agents.into_iter().enumerate() {
            on_progress(agent, ActivityStatus::InProgress);

            let prompt = analysis.subtask_for(index).unwrap_or(user_input);
            let request = AgentRequest::new(agent, prompt)
                .with_conversation(conversations.get(&agent).cloned())
                .with_tools(self.enabled_tools.clone());

            let result = match self.invoker.invoke(request).await {
                Ok(out) => AgentResult {
                    agent,
                    output: out.output,
                    status: ResultStatus::Completed,
                    timestamp: Utc::now(),
                    conversation_id: out.conversation_id,
                    metadata: out.metadata,
                },
                Err(e) => {
                    warn!("Agent {} failed: {}", agent, e);
                    let output = match e {
                        OrchestratorError::AgentInvocationFailed { message, .. } => message,
                        other => other.to_string(),
                    };
                    AgentResult {
                        agent,
                        output,
                        status: ResultStatus::Failed,
                        timestamp: Utc::now(),
                        conversation_id: None,
                        metadata: Value::Null,
                    }
                }
            };

            on_progress(agent, result.status.into());
            results.push(result);
        }

        OrchestratorResult { analysis, results }
    }
}
