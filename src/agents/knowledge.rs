//! Knowledge base writes and feedback on agent decisions
//!
//! Both live next to the agent functions: `store-knowledge` upserts a fact
//! keyed by entity and category, `learn-from-feedback` rates a logged
//! decision and adjusts learned preferences.

use super::remote::RemoteAgentInvoker;
use crate::error::{OrchestratorError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{info, warn};

pub const STORE_KNOWLEDGE_FUNCTION: &str = "store-knowledge";
pub const FEEDBACK_FUNCTION: &str = "learn-from-feedback";

/// Confidence assigned to a fact when the caller gives none
pub const DEFAULT_KNOWLEDGE_CONFIDENCE: f32 = 0.80;

/// Where a fact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Competitor,
    MarketResearch,
    UserPreference,
}

/// A fact to store in the knowledge base
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeEntry {
    pub content: String,
    pub source_type: SourceType,
    /// Company or competitor the fact is about
    pub entity_name: String,
    /// e.g. pricing, features, funding
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub confidence_score: f32,
    pub metadata: Value,
}

impl KnowledgeEntry {
    pub fn new(
        content: impl Into<String>,
        source_type: SourceType,
        entity_name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            source_type,
            entity_name: entity_name.into(),
            category: category.into(),
            source_url: None,
            confidence_score: DEFAULT_KNOWLEDGE_CONFIDENCE,
            metadata: Value::Object(Default::default()),
        }
    }

    pub fn with_source_url(mut self, url: Option<String>) -> Self {
        self.source_url = url;
        self
    }

    /// Clamped into 0.0..=1.0
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence_score = confidence.clamp(0.0, 1.0);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeAction {
    Created,
    Updated,
}

impl fmt::Display for KnowledgeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnowledgeAction::Created => write!(f, "created"),
            KnowledgeAction::Updated => write!(f, "updated"),
        }
    }
}

/// What the knowledge base did with an entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredKnowledge {
    pub knowledge_id: String,
    pub action: KnowledgeAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Positive,
    Negative,
    Neutral,
}

/// A rating of one logged agent decision
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub decision_id: String,
    pub feedback: FeedbackKind,
    /// Preference the rating teaches, e.g. `tagline_style`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference_type: Option<String>,
    /// The output the user picked; kept as an example on positive feedback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_output: Option<Value>,
}

impl Feedback {
    pub fn new(decision_id: impl Into<String>, feedback: FeedbackKind) -> Self {
        Self {
            decision_id: decision_id.into(),
            feedback,
            preference_type: None,
            selected_output: None,
        }
    }

    pub fn with_preference(mut self, preference_type: Option<String>, selected_output: Option<Value>) -> Self {
        self.preference_type = preference_type;
        self.selected_output = selected_output;
        self
    }
}

fn function_failed(function: &str, message: impl Into<String>) -> OrchestratorError {
    OrchestratorError::FunctionFailed {
        function: function.to_string(),
        message: message.into(),
    }
}

impl RemoteAgentInvoker {
    /// Create or update a knowledge entry
    pub async fn store_knowledge(&self, entry: &KnowledgeEntry) -> Result<StoredKnowledge> {
        info!("Storing knowledge: {} - {}", entry.entity_name, entry.category);

        let text = self.post(STORE_KNOWLEDGE_FUNCTION, entry).await.map_err(|message| {
            warn!("store-knowledge failed: {}", message);
            function_failed(STORE_KNOWLEDGE_FUNCTION, message)
        })?;

        serde_json::from_str(&text)
            .map_err(|e| function_failed(STORE_KNOWLEDGE_FUNCTION, format!("malformed response: {}", e)))
    }

    /// Rate a decision. Returns the function's confirmation message.
    pub async fn send_feedback(&self, feedback: &Feedback) -> Result<String> {
        info!("Sending {:?} feedback for decision {}", feedback.feedback, feedback.decision_id);

        let text = self.post(FEEDBACK_FUNCTION, feedback).await.map_err(|message| {
            warn!("learn-from-feedback failed: {}", message);
            function_failed(FEEDBACK_FUNCTION, message)
        })?;

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| function_failed(FEEDBACK_FUNCTION, format!("malformed response: {}", e)))?;
        Ok(value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Feedback recorded")
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knowledge_entry_wire_format() {
        let entry = KnowledgeEntry::new("Pro plan is $12/month", SourceType::Competitor, "Notion", "pricing")
            .with_confidence(1.4);
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["source_type"], "competitor");
        assert_eq!(v["entity_name"], "Notion");
        assert_eq!(v["confidence_score"], 1.0);
        assert_eq!(v["metadata"], serde_json::json!({}));
        assert!(v.get("source_url").is_none());

        let v = serde_json::to_value(KnowledgeEntry::new("x", SourceType::MarketResearch, "e", "c")).unwrap();
        assert_eq!(v["source_type"], "market_research");
        assert!((v["confidence_score"].as_f64().unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_feedback_wire_format() {
        let feedback = Feedback::new("d-1", FeedbackKind::Positive)
            .with_preference(Some("tagline_style".into()), Some(Value::String("Think bold".into())));
        let v = serde_json::to_value(&feedback).unwrap();
        assert_eq!(v["decisionId"], "d-1");
        assert_eq!(v["feedback"], "positive");
        assert_eq!(v["preferenceType"], "tagline_style");
        assert_eq!(v["selectedOutput"], "Think bold");

        let v = serde_json::to_value(Feedback::new("d-2", FeedbackKind::Neutral)).unwrap();
        assert!(v.get("preferenceType").is_none());
        assert!(v.get("selectedOutput").is_none());
    }

    #[test]
    fn test_stored_knowledge_parses() {
        let stored: StoredKnowledge =
            serde_json::from_str(r#"{"success": true, "knowledge_id": "k-7", "action": "updated"}"#).unwrap();
        assert_eq!(stored.knowledge_id, "k-7");
        assert_eq!(stored.action, KnowledgeAction::Updated);
        assert_eq!(stored.action.to_string(), "updated");
    }
}
