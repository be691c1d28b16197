//! Multi-agent orchestration
//!
//! Classify a request, optionally decompose it, dispatch the recommended
//! agents in order and fold the outcome into the caller's session.

pub mod activity;
pub mod classifier;
pub mod cli;
pub mod decomposer;
pub mod session;
pub mod workflow;

pub use activity::{Activity, ActivityLog, ActivityReporter, NewActivity};
pub use classifier::{parse_analysis, IntentClassifier, TaskAnalysis};
pub use decomposer::{parse_subtasks, TaskDecomposer};
pub use session::SessionContext;
pub use workflow::{AgentResult, OrchestratorResult, ProgressFn, WorkflowExecutor};

use crate::agents::{AgentInvoker, LlmAgentInvoker, RemoteAgentInvoker};
use crate::config::{Config, InvokerMode};
use crate::error::{OrchestratorError, Result};
use crate::llm::{ChatModel, GatewayClient};
use crate::types::{ActivityStatus, AgentId, Complexity};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Name under which routing steps appear in the activity feed
pub const ROUTER_NAME: &str = "Smart Router";

/// Outcome of a full [`Orchestrator::run`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub result: OrchestratorResult,
    /// Set when decomposition failed and the agents ran on the raw input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decomposition_error: Option<String>,
}

impl RunReport {
    /// Save as pretty-printed JSON
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Classifier, decomposer and executor behind one entry point
#[derive(Clone)]
pub struct Orchestrator {
    classifier: IntentClassifier,
    decomposer: TaskDecomposer,
    executor: WorkflowExecutor,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn ChatModel>, invoker: Arc<dyn AgentInvoker>) -> Self {
        Self {
            classifier: IntentClassifier::new(llm.clone()),
            decomposer: TaskDecomposer::new(llm),
            executor: WorkflowExecutor::new(invoker),
        }
    }

    /// Wire up the gateway client and agent invoker described by `config`
    pub fn from_config(config: &Config, api_key: &str, functions_token: Option<String>) -> anyhow::Result<Self> {
        let provider = config.gateway.provider_config(api_key)?;
        let client = GatewayClient::with_timeout(provider, Duration::from_secs(config.gateway.timeout_secs))?;
        let llm: Arc<dyn ChatModel> = Arc::new(client);

        let invoker: Arc<dyn AgentInvoker> = match config.agents.mode {
            InvokerMode::Remote => {
                if config.agents.functions_url.is_empty() {
                    anyhow::bail!("agents.mode is \"remote\" but agents.functions_url is not set");
                }
                let mut remote = RemoteAgentInvoker::new(
                    &config.agents.functions_url,
                    Duration::from_secs(config.agents.timeout_secs),
                )?
                .with_function(&config.agents.function);
                if let Some(token) = functions_token {
                    remote = remote.with_token(token);
                }
                Arc::new(remote)
            }
            InvokerMode::Llm => Arc::new(
                LlmAgentInvoker::new(llm.clone(), &config.models.agent)
                    .with_reasoning(config.agents.include_reasoning)
                    .with_max_tokens(config.agents.max_tokens),
            ),
        };

        Ok(Self::new(llm, invoker)
            .with_models(&config.models.classifier, &config.models.decomposer)
            .with_tools(config.agents.enabled_tools.clone()))
    }

    pub fn with_models(mut self, classifier: &str, decomposer: &str) -> Self {
        self.classifier = self.classifier.with_model(classifier);
        self.decomposer = self.decomposer.with_model(decomposer);
        self
    }

    pub fn with_tools(mut self, tools: Vec<crate::agents::AgentTool>) -> Self {
        self.executor = self.executor.with_tools(tools);
        self
    }

    pub async fn classify_intent(&self, user_input: &str) -> Result<TaskAnalysis> {
        self.classifier.classify(user_input).await
    }

    pub async fn decompose_task(&self, task: &str) -> Result<Vec<String>> {
        self.decomposer.decompose(task).await
    }

    pub async fn run_workflow(
        &self,
        user_input: &str,
        analysis: TaskAnalysis,
        on_progress: ProgressFn<'_>,
    ) -> OrchestratorResult {
        self.executor.run(user_input, analysis, on_progress).await
    }

    /// Full pipeline against a session: one credit, classification,
    /// decomposition for complex requests, then sequential dispatch.
    ///
    /// Classification failure aborts the run after the credit is spent.
    /// Decomposition failure is reported and the agents fall back to the raw
    /// input.
    pub async fn run(
        &self,
        session: &mut SessionContext,
        user_input: &str,
        on_progress: ProgressFn<'_>,
    ) -> Result<RunReport> {
        if user_input.trim().is_empty() {
            return Err(OrchestratorError::EmptyInput);
        }
        if !session.deduct_credit() {
            return Err(OrchestratorError::OutOfCredits);
        }

        let activity = session.activity().clone();

        let analysis = match self.classifier.classify(user_input).await {
            Ok(analysis) => analysis,
            Err(e) => {
                activity.record(NewActivity::new(ROUTER_NAME, "Task analysis failed", ActivityStatus::Failed));
                return Err(e);
            }
        };
        activity.record(NewActivity::new(ROUTER_NAME, "Analyzed task intent", ActivityStatus::Completed));

        let mut decomposition_error = None;
        let analysis = if analysis.complexity == Complexity::Complex {
            match self.decomposer.decompose(user_input).await {
                Ok(subtasks) => {
                    activity.record(NewActivity::new(
                        ROUTER_NAME,
                        format!("Decomposed task into {} subtasks", subtasks.len()),
                        ActivityStatus::Completed,
                    ));
                    analysis.with_subtasks(subtasks)
                }
                Err(e) => {
                    warn!("Continuing without decomposition: {}", e);
                    activity.record(NewActivity::new(ROUTER_NAME, "Task decomposition failed", ActivityStatus::Failed));
                    decomposition_error = Some(e.to_string());
                    TaskAnalysis { subtasks: None, ..analysis }
                }
            }
        } else {
            analysis
        };

        let track = |agent: AgentId, status: ActivityStatus| {
            if status != ActivityStatus::InProgress {
                activity.record(NewActivity::new(agent.profile().label, format!("Executed {}", agent), status));
            }
            on_progress(agent, status);
        };

        let result = self
            .executor
            .run_threaded(user_input, analysis, session.conversations(), &track)
            .await;

        info!("Workflow finished: {} completed, {} failed", result.completed(), result.failed());
        session.absorb_results(&result.results);

        Ok(RunReport { result, decomposition_error })
    }
}
