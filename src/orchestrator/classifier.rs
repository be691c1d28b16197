//! Intent classification
//!
//! Maps free-form user text to a [`TaskAnalysis`] with one LLM call. The
//! model is asked to answer in a line-prefixed format (`INTENT:`,
//! `COMPLEXITY:`, `AGENTS:` ...) that [`parse_analysis`] reads back. The
//! parser is deliberately lenient: missing or unreadable fields fall back to
//! defaults instead of failing the call.

use super::decomposer::strip_numbered;
use crate::agents::catalogue;
use crate::error::{OrchestratorError, Result};
use crate::llm::{ChatModel, CompletionRequest, DEFAULT_MODEL};
use crate::types::{AgentId, Complexity};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You are an expert task analyzer for AI agent orchestration.";

pub const DEFAULT_CONFIDENCE: u8 = 80;
pub const DEFAULT_ESTIMATED_TIME: &str = "10 minutes";

/// Structured reading of a user request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAnalysis {
    pub intent: String,
    pub complexity: Complexity,
    /// Dispatch order
    pub recommended_agents: Vec<AgentId>,
    pub recommended_model: String,
    pub suggested_workflow: String,
    /// 0–100
    pub confidence: u8,
    pub estimated_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<String>>,
}

impl Default for TaskAnalysis {
    fn default() -> Self {
        Self {
            intent: String::new(),
            complexity: Complexity::default(),
            recommended_agents: Vec::new(),
            recommended_model: DEFAULT_MODEL.to_string(),
            suggested_workflow: String::new(),
            confidence: DEFAULT_CONFIDENCE,
            estimated_time: DEFAULT_ESTIMATED_TIME.to_string(),
            subtasks: None,
        }
    }
}

impl TaskAnalysis {
    /// Same analysis with its subtask list replaced
    pub fn with_subtasks(self, subtasks: Vec<String>) -> Self {
        Self { subtasks: Some(subtasks), ..self }
    }

    /// Subtask paired with the agent at `index`, if there is one
    pub fn subtask_for(&self, index: usize) -> Option<&str> {
        self.subtasks.as_ref()?.get(index).map(String::as_str)
    }
}

/// Classifies requests against the agent catalogue
#[derive(Clone)]
pub struct IntentClassifier {
    llm: Arc<dyn ChatModel>,
    model: String,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn ChatModel>) -> Self {
        Self { llm, model: DEFAULT_MODEL.to_string() }
    }

    /// Create with custom model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Classify one request. Gateway failures are fatal and not retried.
    pub async fn classify(&self, user_input: &str) -> Result<TaskAnalysis> {
        if user_input.trim().is_empty() {
            return Err(OrchestratorError::EmptyInput);
        }

        info!("Analyzing task intent with model {}", self.model);

        let request = CompletionRequest::single_turn(&self.model, SYSTEM_PROMPT, self.build_prompt(user_input))
            .with_temperature(0.3)
            .with_max_tokens(500);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(OrchestratorError::ClassificationFailed)?;

        debug!("Classifier response: {}", response);

        let analysis = parse_analysis(&response);
        info!(
            "Intent '{}' ({}), {} agents recommended, confidence {}",
            analysis.intent,
            analysis.complexity,
            analysis.recommended_agents.len(),
            analysis.confidence
        );
        Ok(analysis)
    }

    /// The user message sent to the model
    pub fn build_prompt(&self, user_input: &str) -> String {
        format!(
            r#"You are an AI task analyzer. Analyze this user request and provide a structured response.

User Request: "{user_input}"

Available Agents:
{agents}

Analyze and respond in this EXACT format:

INTENT: [One line describing what user wants]
COMPLEXITY: [simple/moderate/complex]
AGENTS: [comma-separated list of recommended agents]
MODEL: {model}
WORKFLOW: [Brief description of suggested workflow]
CONFIDENCE: [number 0-100]
TIME: [estimated time like "5 minutes" or "15 minutes"]
SUBTASKS: [if complex, list numbered subtasks, otherwise write "N/A"]

Be concise and specific."#,
            agents = catalogue(),
            model = self.model,
        )
    }
}

/// Parse a classifier response.
///
/// Lines are matched by prefix without trimming first. A `SUBTASKS:` line
/// whose value is not `N/A` resets the subtask list. Any numbered line
/// (`1.`, `2.` ...) anywhere in the response is appended to the subtasks,
/// including stray ones outside the `SUBTASKS:` block.
pub fn parse_analysis(response: &str) -> TaskAnalysis {
    let mut analysis = TaskAnalysis::default();

    for line in response.split('\n').filter(|l| !l.trim().is_empty()) {
        if let Some(rest) = line.strip_prefix("INTENT:") {
            analysis.intent = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("COMPLEXITY:") {
            if let Some(complexity) = Complexity::parse(&rest.trim().to_lowercase()) {
                analysis.complexity = complexity;
            }
        } else if let Some(rest) = line.strip_prefix("AGENTS:") {
            analysis.recommended_agents = rest
                .trim()
                .split(',')
                .filter_map(|token| AgentId::parse(token.trim()))
                .collect();
        } else if let Some(rest) = line.strip_prefix("MODEL:") {
            analysis.recommended_model = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("WORKFLOW:") {
            analysis.suggested_workflow = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("CONFIDENCE:") {
            if let Some(value) = parse_leading_int(rest.trim()) {
                analysis.confidence = value.clamp(0, 100) as u8;
            }
        } else if let Some(rest) = line.strip_prefix("TIME:") {
            analysis.estimated_time = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("SUBTASKS:") {
            if rest.trim() != "N/A" {
                analysis.subtasks = Some(Vec::new());
            }
        } else if let Some(subtask) = strip_numbered(line) {
            analysis.subtasks.get_or_insert_with(Vec::new).push(subtask.to_string());
        }
    }

    analysis
}

/// Leading integer of `s`, ignoring anything after the digits ("85%" -> 85)
fn parse_leading_int(s: &str) -> Option<i64> {
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return None;
    }
    // Saturate absurdly long numbers instead of rejecting them
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::MockChatModel;

    #[test]
    fn test_parse_documented_fixture() {
        let response = "INTENT: help with pricing\nCOMPLEXITY: simple\nAGENTS: market-analyst, content\nMODEL: x\nWORKFLOW: do it\nCONFIDENCE: 77\nTIME: 5 minutes";
        let analysis = parse_analysis(response);
        assert_eq!(analysis.intent, "help with pricing");
        assert_eq!(analysis.complexity, Complexity::Simple);
        assert_eq!(analysis.recommended_agents, vec![AgentId::MarketAnalyst, AgentId::Content]);
        assert_eq!(analysis.recommended_model, "x");
        assert_eq!(analysis.suggested_workflow, "do it");
        assert_eq!(analysis.confidence, 77);
        assert_eq!(analysis.estimated_time, "5 minutes");
        assert_eq!(analysis.subtasks, None);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let analysis = parse_analysis("INTENT: something");
        assert_eq!(analysis.intent, "something");
        assert_eq!(analysis.complexity, Complexity::Moderate);
        assert_eq!(analysis.confidence, 80);
        assert_eq!(analysis.estimated_time, "10 minutes");
        assert_eq!(analysis.recommended_model, DEFAULT_MODEL);
        assert!(analysis.recommended_agents.is_empty());

        assert_eq!(parse_analysis(""), TaskAnalysis::default());
    }

    #[test]
    fn test_garbage_agents_are_dropped() {
        let analysis = parse_analysis("AGENTS: ceo, Market-Analyst, branding ,  , outreach;content, outreach");
        assert_eq!(analysis.recommended_agents, vec![AgentId::Branding, AgentId::Outreach]);

        let analysis = parse_analysis("AGENTS: [market-analyst, branding]");
        assert!(analysis.recommended_agents.is_empty());
    }

    #[test]
    fn test_duplicate_agents_preserved_in_order() {
        let analysis = parse_analysis("AGENTS: content, branding, content");
        assert_eq!(
            analysis.recommended_agents,
            vec![AgentId::Content, AgentId::Branding, AgentId::Content]
        );
    }

    #[test]
    fn test_invalid_complexity_and_confidence_keep_defaults() {
        let analysis = parse_analysis("COMPLEXITY: very hard\nCONFIDENCE: high");
        assert_eq!(analysis.complexity, Complexity::Moderate);
        assert_eq!(analysis.confidence, 80);

        let analysis = parse_analysis("COMPLEXITY: COMPLEX\nCONFIDENCE: 85%");
        assert_eq!(analysis.complexity, Complexity::Complex);
        assert_eq!(analysis.confidence, 85);

        assert_eq!(parse_analysis("CONFIDENCE: 250").confidence, 100);
        assert_eq!(parse_analysis("CONFIDENCE: -5").confidence, 0);
    }

    #[test]
    fn test_indented_prefixes_are_not_recognized() {
        let analysis = parse_analysis("  INTENT: hidden\nTIME:   2 hours  ");
        assert_eq!(analysis.intent, "");
        assert_eq!(analysis.estimated_time, "2 hours");
    }

    #[test]
    fn test_subtasks_after_marker() {
        let response = "COMPLEXITY: complex\nSUBTASKS:\n1. Research competitors\n2.  Draft positioning \n3.Write launch email";
        let analysis = parse_analysis(response);
        assert_eq!(
            analysis.subtasks,
            Some(vec![
                "Research competitors".to_string(),
                "Draft positioning".to_string(),
                "Write launch email".to_string(),
            ])
        );
    }

    #[test]
    fn test_subtasks_na_leaves_list_absent() {
        let analysis = parse_analysis("SUBTASKS: N/A");
        assert_eq!(analysis.subtasks, None);
    }

    #[test]
    fn test_stray_numbered_lines_leak_into_subtasks() {
        // Numbered lines are collected wherever they appear
        let response = "INTENT: x\n1. stray\nSUBTASKS: N/A\n2. also stray";
        let analysis = parse_analysis(response);
        assert_eq!(analysis.subtasks, Some(vec!["stray".to_string(), "also stray".to_string()]));
    }

    #[test]
    fn test_subtasks_marker_resets_earlier_items() {
        let response = "1. early\nSUBTASKS: see below\n1. kept";
        let analysis = parse_analysis(response);
        assert_eq!(analysis.subtasks, Some(vec!["kept".to_string()]));
    }

    #[test]
    fn test_with_subtasks_and_pairing() {
        let analysis = TaskAnalysis::default().with_subtasks(vec!["a".into(), "b".into()]);
        assert_eq!(analysis.subtask_for(1), Some("b"));
        assert_eq!(analysis.subtask_for(2), None);
        assert_eq!(TaskAnalysis::default().subtask_for(0), None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let v = serde_json::to_value(TaskAnalysis::default()).unwrap();
        assert_eq!(v["recommendedModel"], DEFAULT_MODEL);
        assert_eq!(v["estimatedTime"], "10 minutes");
        assert!(v.get("subtasks").is_none());
    }

    #[tokio::test]
    async fn test_classify_sends_single_turn_request() {
        let mut llm = MockChatModel::new();
        llm.expect_complete()
            .withf(|req| {
                req.model == DEFAULT_MODEL
                    && req.temperature == 0.3
                    && req.max_tokens == 500
                    && req.messages.len() == 2
                    && req.messages[1].content.contains("User Request: \"launch my app\"")
                    && req.messages[1].content.contains("- branding: Brand identity")
            })
            .times(1)
            .returning(|_| Ok("INTENT: launch\nAGENTS: branding".to_string()));

        let classifier = IntentClassifier::new(Arc::new(llm));
        let analysis = classifier.classify("launch my app").await.unwrap();
        assert_eq!(analysis.recommended_agents, vec![AgentId::Branding]);
    }

    #[tokio::test]
    async fn test_classify_rejects_blank_input_without_calling_llm() {
        let mut llm = MockChatModel::new();
        llm.expect_complete().times(0);
        let classifier = IntentClassifier::new(Arc::new(llm));
        let err = classifier.classify("   \n").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::EmptyInput));
    }

    #[tokio::test]
    async fn test_classify_gateway_failure() {
        let mut llm = MockChatModel::new();
        llm.expect_complete()
            .returning(|_| Err(LlmError::Api { status: 401, body: "bad key".into() }));
        let classifier = IntentClassifier::new(Arc::new(llm));
        let err = classifier.classify("help").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ClassificationFailed(LlmError::Api { status: 401, .. })));
    }
}
