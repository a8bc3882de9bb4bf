//! Wire models for the hub API.
//!
//! Clients see the trimmed [`JobView`]; the scheduler's internal
//! bookkeeping (`updated_at`, `requested_at`) and the log/history
//! sequences stay off this shape — the latter two have their own
//! endpoints.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::job::{Job, JobState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

/// A job as presented to clients. All fields are optional on the wire
/// so the "no job available" reply can be an empty object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobView {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<JobState>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub download_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub info_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobView {
    pub fn empty() -> Self {
        Self::default()
    }
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            state: Some(job.state),
            download_url: job.download_url.clone(),
            info_url: job.info_url.clone(),
            name: job.name.clone(),
            description: job.description.clone(),
            added_at: Some(job.added_at),
            started_at: job.started_at,
            finished_at: job.finished_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub uptime: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpStatusBody {
    pub status_code: u16,
    pub status: String,
    pub content_length: i64,
}

#[derive(Debug, Serialize)]
pub struct WorkTimeBody {
    pub local_time: DateTime<Local>,
    pub local_time_utc: DateTime<Utc>,
    pub dnd_starts_at: i64,
    pub dnd_ends_at: i64,
    pub is_work_time: bool,
    pub dnd_enable: bool,
}

/// `?url=` query for the HEAD probe and the movie info endpoints.
#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    #[serde(default)]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::NewJob;

    #[test]
    fn test_empty_job_view_serializes_to_empty_object() {
        assert_eq!(serde_json::to_string(&JobView::empty()).unwrap(), "{}");
    }

    #[test]
    fn test_job_view_hides_internals() {
        let now = Utc::now();
        let mut job = Job::create(
            "AB12CD34-0000-4000-8000-000000000001".to_string(),
            NewJob {
                download_url: "http://x/y.mkv".to_string(),
                ..NewJob::default()
            },
            now,
        );
        job.requested_at = Some(now);
        job.touch(now);

        let value = serde_json::to_value(JobView::from(&job)).unwrap();
        assert_eq!(value["id"], job.id);
        assert_eq!(value["state"], "pending");
        assert!(value.get("requested_at").is_none());
        assert!(value.get("updated_at").is_none());
        assert!(value.get("state_history").is_none());
        assert!(value.get("log").is_none());
    }
}
