//! Per-user session state
//!
//! Everything the host keeps between runs: credits, the activity feed,
//! outputs agents share with each other, and conversation ids for agents
//! that keep history. Saved as JSON; never holds the API key.

use super::activity::{Activity, ActivityLog, DEFAULT_CAPACITY};
use super::workflow::AgentResult;
use crate::types::AgentId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_CREDITS: u32 = 50;
pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_name: Option<String>,
    credits: u32,
    initial_credits: u32,
    activity: ActivityLog,
    shared_context: BTreeMap<String, String>,
    conversations: HashMap<AgentId, String>,
}

/// On-disk form of a session
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    user_name: Option<String>,
    credits: u32,
    #[serde(default)]
    activity: Vec<Activity>,
    #[serde(default)]
    shared_context: BTreeMap<String, String>,
    /// Keyed by agent wire name
    #[serde(default)]
    conversations: BTreeMap<String, String>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(DEFAULT_CREDITS, DEFAULT_CAPACITY)
    }
}

impl SessionContext {
    pub fn new(initial_credits: u32, activity_capacity: usize) -> Self {
        Self {
            user_name: None,
            credits: initial_credits,
            initial_credits,
            activity: ActivityLog::with_capacity(activity_capacity),
            shared_context: BTreeMap::new(),
            conversations: HashMap::new(),
        }
    }

    /// Load a saved session, or start a fresh one if the file does not exist
    pub fn load(path: &Path, initial_credits: u32, activity_capacity: usize) -> Result<Self> {
        if !path.exists() {
            debug!("No session at {:?}, starting fresh", path);
            return Ok(Self::new(initial_credits, activity_capacity));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {:?}", path))?;
        let file: SessionFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file {:?}", path))?;

        Ok(Self {
            user_name: file.user_name,
            credits: file.credits,
            initial_credits,
            activity: ActivityLog::from_entries(file.activity, activity_capacity),
            shared_context: file.shared_context,
            conversations: file
                .conversations
                .into_iter()
                .filter_map(|(agent, id)| Some((AgentId::parse(&agent)?, id)))
                .collect(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = SessionFile {
            user_name: self.user_name.clone(),
            credits: self.credits,
            activity: self.activity.entries(),
            shared_context: self.shared_context.clone(),
            conversations: self
                .conversations
                .iter()
                .map(|(agent, id)| (agent.to_string(), id.clone()))
                .collect(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write session file {:?}", path))?;
        Ok(())
    }

    pub fn credits(&self) -> u32 {
        self.credits
    }

    /// Spend one credit. Returns false, leaving the balance at zero, when
    /// none are left.
    pub fn deduct_credit(&mut self) -> bool {
        if self.credits == 0 {
            return false;
        }
        self.credits -= 1;
        true
    }

    /// Restore the starting balance
    pub fn reset_credits(&mut self) {
        self.credits = self.initial_credits;
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn shared_context(&self, key: &str) -> Option<&str> {
        self.shared_context.get(key).map(String::as_str)
    }

    pub fn shared_context_entries(&self) -> &BTreeMap<String, String> {
        &self.shared_context
    }

    pub fn conversation(&self, agent: AgentId) -> Option<&str> {
        self.conversations.get(&agent).map(String::as_str)
    }

    pub fn conversations(&self) -> &HashMap<AgentId, String> {
        &self.conversations
    }

    /// Start every agent's conversation over
    pub fn clear_conversations(&mut self) {
        self.conversations.clear();
    }

    /// Fold completed agent results into the session: shared outputs are
    /// stored under the agent's context key and returned conversation ids
    /// are remembered. Failed results change nothing.
    pub fn absorb_results(&mut self, results: &[AgentResult]) {
        for result in results.iter().filter(|r| r.is_completed()) {
            if let Some(key) = result.agent.profile().shared_context_key {
                self.shared_context.insert(key.to_string(), result.output.clone());
            }
            if let Some(id) = &result.conversation_id {
                self.conversations.insert(result.agent, id.clone());
            }
        }
    }
}
