//! Activity feed
//!
//! A short, newest-first history of what the orchestrator did. Recording
//! never fails and never waits on I/O.

use crate::types::ActivityStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_CAPACITY: usize = 10;

/// A recorded activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub agent: String,
    pub title: String,
    pub status: ActivityStatus,
    pub timestamp: DateTime<Utc>,
}

/// An activity before it is stamped with an id and time
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub agent: String,
    pub title: String,
    pub status: ActivityStatus,
}

impl NewActivity {
    pub fn new(agent: impl Into<String>, title: impl Into<String>, status: ActivityStatus) -> Self {
        Self {
            agent: agent.into(),
            title: title.into(),
            status,
        }
    }
}

/// Sink for activity records
pub trait ActivityReporter: Send + Sync {
    fn record(&self, activity: NewActivity);
}

/// Bounded in-memory activity log. Clones share the same entries.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: Arc<Mutex<VecDeque<Activity>>>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Rebuild a log from persisted entries (newest first), dropping any
    /// beyond `capacity`
    pub fn from_entries(entries: Vec<Activity>, capacity: usize) -> Self {
        let mut entries: VecDeque<Activity> = entries.into();
        entries.truncate(capacity);
        Self {
            entries: Arc::new(Mutex::new(entries)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of the log, newest first
    pub fn entries(&self) -> Vec<Activity> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Activity>> {
        // A panic while holding the lock cannot leave the deque half-updated
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ActivityReporter for ActivityLog {
    fn record(&self, activity: NewActivity) {
        info!("[{}] {} ({})", activity.agent, activity.title, activity.status);

        let entry = Activity {
            id: Uuid::new_v4().to_string(),
            agent: activity.agent,
            title: activity.title,
            status: activity.status,
            timestamp: Utc::now(),
        };

        let mut entries = self.lock();
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_and_bounded() {
        let log = ActivityLog::new();
        for i in 0..12 {
            log.record(NewActivity::new("Smart Router", format!("event {}", i), ActivityStatus::Completed));
        }
        let entries = log.entries();
        assert_eq!(entries.len(), DEFAULT_CAPACITY);
        assert_eq!(entries[0].title, "event 11");
        assert_eq!(entries[9].title, "event 2");
    }

    #[test]
    fn test_entries_get_unique_ids() {
        let log = ActivityLog::with_capacity(3);
        log.record(NewActivity::new("a", "one", ActivityStatus::InProgress));
        log.record(NewActivity::new("a", "two", ActivityStatus::Failed));
        let entries = log.entries();
        assert_ne!(entries[0].id, entries[1].id);
        assert!(entries[0].timestamp >= entries[1].timestamp);
        assert_eq!(entries[0].status, ActivityStatus::Failed);
    }

    #[test]
    fn test_clones_share_entries() {
        let log = ActivityLog::new();
        let reporter: Arc<dyn ActivityReporter> = Arc::new(log.clone());
        reporter.record(NewActivity::new("content", "Executed content", ActivityStatus::Completed));
        assert_eq!(log.len(), 1);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_from_entries_truncates() {
        let log = ActivityLog::new();
        for i in 0..5 {
            log.record(NewActivity::new("x", i.to_string(), ActivityStatus::Completed));
        }
        let restored = ActivityLog::from_entries(log.entries(), 2);
        let titles: Vec<_> = restored.entries().into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["4", "3"]);
    }

    #[test]
    fn test_activity_serialization() {
        let log = ActivityLog::new();
        log.record(NewActivity::new("branding", "Executed branding", ActivityStatus::InProgress));
        let v = serde_json::to_value(&log.entries()[0]).unwrap();
        assert_eq!(v["status"], "in-progress");
        assert!(v["timestamp"].as_str().is_some());
    }
}
