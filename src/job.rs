//! Job domain model: lifecycle states, transition bookkeeping and the
//! derived predicates the scheduler dispatches on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How long a dispatched job may sit in `requested` before it is
/// considered abandoned by its worker.
pub const ZOMBIE_AFTER_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Requested,
    Working,
    Finished,
    Failed,
    Canceled,
    Deleted,
}

impl JobState {
    /// Terminal for scheduling purposes.
    pub fn is_done(self) -> bool {
        matches!(self, JobState::Finished | JobState::Failed | JobState::Canceled)
    }

    /// Eligible for dispatch.
    pub fn is_available(self) -> bool {
        self == JobState::Pending
    }

    /// Counted against the parallelism cap: neither dispatchable nor done.
    pub fn is_active(self) -> bool {
        !self.is_available() && !self.is_done()
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Pending => "pending",
            JobState::Requested => "requested",
            JobState::Working => "working",
            JobState::Finished => "finished",
            JobState::Failed => "failed",
            JobState::Canceled => "canceled",
            JobState::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// Who drove a state transition: a polling/updating client or the
/// scheduler itself (dispatch, zombie reclaim).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Initiator {
    User,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateHistoryItem {
    pub initiator: Initiator,
    pub changed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_state: Option<JobState>,
    pub to_state: JobState,
}

/// One progress line, appended either by a worker over HTTP or by the
/// indexer through the message bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogItem {
    #[serde(default)]
    pub initiator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub job_id: String,
    #[serde(default)]
    pub message: String,
}

/// Fields a client may supply when creating a job. Everything but the
/// download URL is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewJob {
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub info_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A partial update from `PUT /job/{id}/`. Empty strings leave the
/// stored value untouched; an unknown state fails to decode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobUpdate {
    #[serde(default)]
    pub state: Option<JobState>,
    #[serde(default)]
    pub info_url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// The authoritative job record. This full form is what snapshots and
/// the `jobs` bus topic carry; clients get the trimmed
/// [`crate::api::models::JobView`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub state: JobState,
    pub download_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub info_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub added_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state_history: Vec<StateHistoryItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log: Vec<LogItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Build a freshly added job in `pending` with its creation recorded
    /// as the first history entry.
    pub fn create(id: String, new: NewJob, now: DateTime<Utc>) -> Self {
        Self {
            id,
            state: JobState::Pending,
            download_url: new.download_url,
            info_url: new.info_url,
            name: new.name,
            description: new.description,
            added_at: now,
            started_at: None,
            finished_at: None,
            state_history: vec![StateHistoryItem {
                initiator: Initiator::System,
                changed_at: now,
                from_state: None,
                to_state: JobState::Pending,
            }],
            log: Vec::new(),
            updated_at: None,
            requested_at: None,
        }
    }

    /// Move to `state`, appending a history entry tagged with the
    /// initiator. The caller is responsible for timestamp side effects
    /// (`started_at`, `finished_at`, `requested_at`).
    pub fn set_state(&mut self, state: JobState, initiator: Initiator, now: DateTime<Utc>) {
        self.state_history.push(StateHistoryItem {
            initiator,
            changed_at: now,
            from_state: Some(self.state),
            to_state: state,
        });
        self.state = state;
    }

    pub fn is_available(&self) -> bool {
        self.state.is_available()
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Dispatched but unclaimed for longer than [`ZOMBIE_AFTER_MINUTES`].
    pub fn is_zombie(&self, now: DateTime<Utc>) -> bool {
        self.state == JobState::Requested
            && self.requested_at.is_some_and(|t| {
                now.signed_duration_since(t) > chrono::Duration::minutes(ZOMBIE_AFTER_MINUTES)
            })
    }

    /// Append a log line, stamping its ingestion time.
    pub fn add_log_item(&mut self, mut item: LogItem, now: DateTime<Utc>) -> LogItem {
        item.added_at = Some(now);
        self.log.push(item.clone());
        item
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    pub fn clear_state_history(&mut self) {
        self.state_history.clear();
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}
