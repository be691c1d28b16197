//! Task decomposition
//!
//! Breaks a complex request into an ordered list of subtasks. Subtasks are
//! paired with recommended agents by position when a workflow runs.

use crate::error::{OrchestratorError, Result};
use crate::llm::{ChatModel, CompletionRequest, DEFAULT_MODEL};
use regex::Regex;
use std::sync::Arc;
use std::sync::LazyLock;
use tracing::{info, warn};

const SYSTEM_PROMPT: &str = "You are an expert at breaking down complex tasks into manageable subtasks.";

/// ASCII digits followed by a dot at the very start of the line
static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.").expect("valid numbered line regex"));

/// Text of a numbered list item with its `N.` marker removed, or `None`
/// when the line is not numbered
pub(crate) fn strip_numbered(line: &str) -> Option<&str> {
    let marker = NUMBERED_LINE.find(line)?;
    Some(line[marker.end()..].trim())
}

/// Ordered subtasks from a numbered-list response. Everything that is not a
/// numbered line is ignored.
pub fn parse_subtasks(response: &str) -> Vec<String> {
    response
        .split('\n')
        .filter_map(strip_numbered)
        .map(str::to_string)
        .collect()
}

#[derive(Clone)]
pub struct TaskDecomposer {
    llm: Arc<dyn ChatModel>,
    model: String,
}

impl TaskDecomposer {
    pub fn new(llm: Arc<dyn ChatModel>) -> Self {
        Self { llm, model: DEFAULT_MODEL.to_string() }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Decompose a request into subtasks. An empty list is a valid outcome.
    pub async fn decompose(&self, task: &str) -> Result<Vec<String>> {
        if task.trim().is_empty() {
            return Err(OrchestratorError::EmptyInput);
        }

        let request = CompletionRequest::single_turn(&self.model, SYSTEM_PROMPT, build_prompt(task))
            .with_temperature(0.5)
            .with_max_tokens(400);

        let response = self.llm.complete(request).await.map_err(|e| {
            warn!("Task decomposition failed: {}", e);
            OrchestratorError::DecompositionFailed(e)
        })?;

        let subtasks = parse_subtasks(&response);
        info!("Decomposed task into {} subtasks", subtasks.len());
        Ok(subtasks)
    }
}

fn build_prompt(task: &str) -> String {
    format!(
        r#"Break down this complex task into 5-7 specific, actionable subtasks.

Complex Task: "{task}"

Provide ONLY a numbered list of subtasks, nothing else. Each subtask should be specific and executable.

Example format:
1. Research competitor pricing strategies
2. Analyze target audience demographics
3. Identify unique value propositions

Now break down the task above:"#
    )
}
