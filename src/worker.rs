//! Worker liveness records, keyed by client IP and upserted on every poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A worker that has not polled for this many minutes is demoted to
/// inactive.
pub const SILENT_AFTER_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub ip: String,
    pub state: WorkerState,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_agent: String,
    pub last_seen_at: DateTime<Utc>,
}

impl Worker {
    /// A fresh (or refreshed) record for a worker that just polled.
    pub fn seen(ip: String, user_agent: String, now: DateTime<Utc>) -> Self {
        Self {
            ip,
            state: WorkerState::Active,
            user_agent,
            last_seen_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == WorkerState::Active
    }

    pub fn is_zombie(&self, now: DateTime<Utc>) -> bool {
        self.is_active()
            && now.signed_duration_since(self.last_seen_at)
                > chrono::Duration::minutes(SILENT_AFTER_MINUTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seen_is_active() {
        let now = Utc::now();
        let worker = Worker::seen("10.0.0.7".to_string(), "peskar-index/1.0".to_string(), now);
        assert!(worker.is_active());
        assert_eq!(worker.last_seen_at, now);
    }

    #[test]
    fn test_zombie_after_five_minutes_silence() {
        let now = Utc::now();
        let worker = Worker::seen("10.0.0.7".to_string(), String::new(), now);
        assert!(!worker.is_zombie(now));
        assert!(!worker.is_zombie(now + chrono::Duration::minutes(5)));
        assert!(worker.is_zombie(now + chrono::Duration::minutes(6)));
    }

    #[test]
    fn test_inactive_worker_is_not_zombie() {
        let now = Utc::now();
        let mut worker = Worker::seen("10.0.0.7".to_string(), String::new(), now);
        worker.state = WorkerState::Inactive;
        assert!(!worker.is_zombie(now + chrono::Duration::hours(1)));
    }
}
