//! In-process counters for hub activity.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    jobs_created: AtomicU64,
    jobs_dispatched: AtomicU64,
    jobs_reclaimed: AtomicU64,
    publishes_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_created(&self) {
        self.jobs_created.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_created", "Metric incremented");
    }

    pub fn job_dispatched(&self) {
        self.jobs_dispatched.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_dispatched", "Metric incremented");
    }

    pub fn job_reclaimed(&self) {
        self.jobs_reclaimed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_reclaimed", "Metric incremented");
    }

    pub fn publish_failed(&self) {
        self.publishes_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "publishes_failed", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs_created: self.jobs_created.load(Ordering::Relaxed),
            jobs_dispatched: self.jobs_dispatched.load(Ordering::Relaxed),
            jobs_reclaimed: self.jobs_reclaimed.load(Ordering::Relaxed),
            publishes_failed: self.publishes_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub jobs_created: u64,
    pub jobs_dispatched: u64,
    pub jobs_reclaimed: u64,
    pub publishes_failed: u64,
}
