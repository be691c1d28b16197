//! Shared types used across modules
//!
//! This module contains types that are used by the classifier, the agents
//! and the workflow executor, kept here to avoid circular dependencies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four fixed task specialists the orchestrator can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentId {
    #[serde(rename = "market-analyst")]
    MarketAnalyst,
    #[serde(rename = "branding")]
    Branding,
    #[serde(rename = "content")]
    Content,
    #[serde(rename = "outreach")]
    Outreach,
}

impl AgentId {
    /// Every agent, in catalogue order
    pub const ALL: [AgentId; 4] = [
        AgentId::MarketAnalyst,
        AgentId::Branding,
        AgentId::Content,
        AgentId::Outreach,
    ];

    /// Canonical wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::MarketAnalyst => "market-analyst",
            AgentId::Branding => "branding",
            AgentId::Content => "content",
            AgentId::Outreach => "outreach",
        }
    }

    /// Exact match against the canonical names. No trimming, no case folding.
    pub fn parse(name: &str) -> Option<Self> {
        AgentId::ALL.into_iter().find(|agent| agent.as_str() == name)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much work the classifier thinks a request is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Moderate,
    Complex,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
        }
    }

    /// Accepts only the three lowercase names
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "simple" => Some(Complexity::Simple),
            "moderate" => Some(Complexity::Moderate),
            "complex" => Some(Complexity::Complex),
            _ => None,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal status of one agent dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Completed,
    Failed,
}

/// Status carried by activity records and progress callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityStatus {
    Completed,
    InProgress,
    Failed,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Completed => "completed",
            ActivityStatus::InProgress => "in-progress",
            ActivityStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ResultStatus> for ActivityStatus {
    fn from(status: ResultStatus) -> Self {
        match status {
            ResultStatus::Completed => ActivityStatus::Completed,
            ResultStatus::Failed => ActivityStatus::Failed,
        }
    }
}

/// Role of a chat message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}
