//! In-memory store and the operations over it.
//!
//! One lock guards both collections; every public operation holds it for
//! its whole critical section so admission+dispatch, update+publish and
//! delete+activity-check stay atomic. The indexer callback funnels into
//! the same lock; it is the only cross-component synchronization point.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::job::{Initiator, Job, JobState, JobUpdate, LogItem, NewJob, StateHistoryItem};
use crate::messaging::{MessageBus, TOPIC_JOBS};
use crate::observability::{Metrics, MetricsSnapshot};
use crate::snapshot::{SnapshotClient, SnapshotError};
use crate::worker::{Worker, WorkerState};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Download URL cant be empty")]
    EmptyDownloadUrl,

    #[error("Job for '{0}' already exists")]
    DuplicateDownloadUrl(String),

    #[error("Job id '{0}' not found")]
    UnknownJob(String),

    #[error("Cant delete active job '{0}'")]
    DeleteActive(String),

    #[error("Cant change state from '{from}' to '{to}'")]
    StateNotAllowed { from: JobState, to: JobState },

    #[error("Only {limit} job(s) cant run parallel, current running {active} job(s)")]
    CapacityExhausted { limit: usize, active: usize },

    #[error("Empty log message")]
    EmptyLogMessage,

    #[error("could not decode log item: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

#[derive(Default)]
struct Store {
    jobs: HashMap<String, Job>,
    workers: HashMap<String, Worker>,
}

pub struct Scheduler {
    state: Mutex<Store>,
    bus: Arc<dyn MessageBus>,
    metrics: Metrics,
    parallel_job_count: usize,
}

fn new_job_id() -> String {
    Uuid::new_v4().to_string().to_uppercase()
}

impl Scheduler {
    pub fn new(parallel_job_count: usize, bus: Arc<dyn MessageBus>) -> Self {
        Self {
            state: Mutex::new(Store::default()),
            bus,
            metrics: Metrics::new(),
            parallel_job_count,
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Register a new job. The caller-supplied id, if any, was already
    /// discarded at decode time; a fresh one is generated here.
    pub async fn add_job(&self, new: NewJob) -> Result<Job> {
        if new.download_url.is_empty() {
            return Err(SchedulerError::EmptyDownloadUrl);
        }
        let mut store = self.state.lock().await;
        if store
            .jobs
            .values()
            .any(|job| !job.is_done() && job.download_url == new.download_url)
        {
            return Err(SchedulerError::DuplicateDownloadUrl(new.download_url));
        }
        let job = Job::create(new_job_id(), new, Utc::now());
        store.jobs.insert(job.id.clone(), job.clone());
        self.metrics.job_created();
        Ok(job)
    }

    /// Worker poll: upsert the worker record, enforce the parallelism
    /// cap, then hand out the first available job as `requested`.
    /// Returns `Ok(None)` when nothing is available.
    pub async fn dispatch(&self, ip: String, user_agent: String) -> Result<Option<Job>> {
        let mut store = self.state.lock().await;
        let now = Utc::now();
        store
            .workers
            .insert(ip.clone(), Worker::seen(ip, user_agent, now));

        let active = store.jobs.values().filter(|job| job.is_active()).count();
        if active >= self.parallel_job_count {
            return Err(SchedulerError::CapacityExhausted {
                limit: self.parallel_job_count,
                active,
            });
        }

        for job in store.jobs.values_mut() {
            if job.is_available() {
                job.set_state(JobState::Requested, Initiator::System, now);
                job.requested_at = Some(now);
                self.metrics.job_dispatched();
                debug!(job_id = %job.id, "Job dispatched");
                return Ok(Some(job.clone()));
            }
        }
        Ok(None)
    }

    pub async fn get_job(&self, id: &str) -> Result<Job> {
        let store = self.state.lock().await;
        store
            .jobs
            .get(id)
            .cloned()
            .ok_or_else(|| SchedulerError::UnknownJob(id.to_string()))
    }

    pub async fn list_jobs(&self) -> Vec<Job> {
        self.state.lock().await.jobs.values().cloned().collect()
    }

    pub async fn list_workers(&self) -> Vec<Worker> {
        self.state.lock().await.workers.values().cloned().collect()
    }

    /// Apply a client update. Non-empty metadata fields are merged; a
    /// state change runs the transition rules and publishes the full job
    /// on the `jobs` topic (best-effort, never retried).
    pub async fn update_job(&self, id: &str, update: JobUpdate) -> Result<Job> {
        let mut store = self.state.lock().await;
        let job = store
            .jobs
            .get_mut(id)
            .ok_or_else(|| SchedulerError::UnknownJob(id.to_string()))?;
        let now = Utc::now();

        // Validate the transition before touching the record so a
        // rejected update leaves the job exactly as it was.
        let transition = match update.state {
            Some(to) if to != job.state => {
                if to == JobState::Requested {
                    return Err(SchedulerError::StateNotAllowed {
                        from: job.state,
                        to,
                    });
                }
                Some(to)
            }
            _ => None,
        };

        job.touch(now);
        if !update.info_url.is_empty() {
            job.info_url = update.info_url;
        }
        if !update.name.is_empty() {
            job.name = update.name;
        }
        if !update.description.is_empty() {
            job.description = update.description;
        }

        if let Some(to) = transition {
            if to == JobState::Pending {
                job.started_at = None;
                job.finished_at = None;
            }
            if job.state == JobState::Requested && to == JobState::Working {
                job.started_at = Some(now);
            }
            if to.is_done() {
                job.finished_at = Some(now);
            }
            job.set_state(to, Initiator::User, now);

            match serde_json::to_vec(&*job) {
                Ok(payload) => {
                    if let Err(err) = self.bus.publish(TOPIC_JOBS, payload).await {
                        warn!(job_id = %job.id, error = %err, "Could not publish job update");
                        self.metrics.publish_failed();
                    }
                }
                Err(err) => {
                    warn!(job_id = %job.id, error = %err, "Could not encode job for publishing");
                    self.metrics.publish_failed();
                }
            }
        }

        Ok(job.clone())
    }

    /// Remove a job. Only jobs that are available or done may go; an
    /// active job must be canceled first.
    pub async fn delete_job(&self, id: &str) -> Result<()> {
        let mut store = self.state.lock().await;
        let job = store
            .jobs
            .get(id)
            .ok_or_else(|| SchedulerError::UnknownJob(id.to_string()))?;
        if !job.is_available() && !job.is_done() {
            return Err(SchedulerError::DeleteActive(id.to_string()));
        }
        store.jobs.remove(id);
        Ok(())
    }

    /// Append a log line via HTTP. The message must be non-empty; the
    /// ingestion time is stamped here.
    pub async fn append_log(&self, id: &str, item: LogItem) -> Result<LogItem> {
        let mut store = self.state.lock().await;
        let job = store
            .jobs
            .get_mut(id)
            .ok_or_else(|| SchedulerError::UnknownJob(id.to_string()))?;
        if item.message.is_empty() {
            return Err(SchedulerError::EmptyLogMessage);
        }
        let now = Utc::now();
        let stamped = job.add_log_item(item, now);
        job.touch(now);
        Ok(stamped)
    }

    pub async fn job_log(&self, id: &str) -> Result<Vec<LogItem>> {
        let store = self.state.lock().await;
        store
            .jobs
            .get(id)
            .map(|job| job.log.clone())
            .ok_or_else(|| SchedulerError::UnknownJob(id.to_string()))
    }

    pub async fn clear_log(&self, id: &str) -> Result<()> {
        let mut store = self.state.lock().await;
        let job = store
            .jobs
            .get_mut(id)
            .ok_or_else(|| SchedulerError::UnknownJob(id.to_string()))?;
        job.clear_log();
        job.touch(Utc::now());
        Ok(())
    }

    pub async fn job_state_history(&self, id: &str) -> Result<Vec<StateHistoryItem>> {
        let store = self.state.lock().await;
        store
            .jobs
            .get(id)
            .map(|job| job.state_history.clone())
            .ok_or_else(|| SchedulerError::UnknownJob(id.to_string()))
    }

    pub async fn clear_state_history(&self, id: &str) -> Result<()> {
        let mut store = self.state.lock().await;
        let job = store
            .jobs
            .get_mut(id)
            .ok_or_else(|| SchedulerError::UnknownJob(id.to_string()))?;
        job.clear_state_history();
        job.touch(Utc::now());
        Ok(())
    }

    /// Indexer callback: parse a log item from the bus and append it to
    /// its job. Unknown job ids and empty messages are errors; no job is
    /// ever created from this path.
    pub async fn ingest_log(&self, payload: &[u8]) -> Result<()> {
        let item: LogItem = serde_json::from_slice(payload)?;
        let mut store = self.state.lock().await;
        let job = store
            .jobs
            .get_mut(&item.job_id)
            .ok_or_else(|| SchedulerError::UnknownJob(item.job_id.clone()))?;
        if item.message.is_empty() {
            return Err(SchedulerError::EmptyLogMessage);
        }
        job.add_log_item(item, Utc::now());
        Ok(())
    }

    /// Put every zombie back to `pending` so another worker can pick it
    /// up. Returns how many were reclaimed.
    pub async fn reclaim_zombie_jobs(&self) -> usize {
        let mut store = self.state.lock().await;
        let now = Utc::now();
        let mut reclaimed = 0;
        for job in store.jobs.values_mut() {
            if !job.is_zombie(now) {
                continue;
            }
            debug!(job_id = %job.id, "Switching state to 'pending' for zombie job");
            job.set_state(JobState::Pending, Initiator::System, now);
            self.metrics.job_reclaimed();
            reclaimed += 1;
        }
        reclaimed
    }

    /// Demote workers that have been silent for too long.
    pub async fn expire_silent_workers(&self) -> usize {
        let mut store = self.state.lock().await;
        let now = Utc::now();
        let mut expired = 0;
        for worker in store.workers.values_mut() {
            if !worker.is_zombie(now) {
                continue;
            }
            debug!(ip = %worker.ip, "Switching state to 'inactive' for silent worker");
            worker.state = WorkerState::Inactive;
            expired += 1;
        }
        expired
    }

    /// Write both collections to disk. The lock is held only long enough
    /// to deep-copy the maps; serialization and file I/O run without it.
    pub async fn persist(&self, client: &SnapshotClient) -> std::result::Result<(), SnapshotError> {
        let (jobs, workers) = {
            let store = self.state.lock().await;
            (store.jobs.clone(), store.workers.clone())
        };
        client.save("jobs", &jobs)?;
        info!("Jobs saved: {}", jobs.len());
        client.save("workers", &workers)?;
        info!("Workers saved: {}", workers.len());
        Ok(())
    }

    /// Load both collections from disk. Missing snapshots leave the
    /// store empty (first run); anything else is surfaced to the caller.
    pub async fn restore(&self, client: &SnapshotClient) -> std::result::Result<(), SnapshotError> {
        let mut store = self.state.lock().await;
        match client.load::<HashMap<String, Job>>("jobs") {
            Ok(jobs) => {
                info!("Jobs loaded: {}", jobs.len());
                store.jobs = jobs;
            }
            Err(SnapshotError::NotFound(_)) => info!("No jobs snapshot, starting empty"),
            Err(err) => return Err(err),
        }
        match client.load::<HashMap<String, Worker>>("workers") {
            Ok(workers) => {
                info!("Workers loaded: {}", workers.len());
                store.workers = workers;
            }
            Err(SnapshotError::NotFound(_)) => info!("No workers snapshot, starting empty"),
            Err(err) => return Err(err),
        }
        Ok(())
    }
}
