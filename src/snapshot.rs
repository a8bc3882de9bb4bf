//! Snapshot store: each named collection persists as one JSON document
//! under the data directory.
//!
//! Keys are sanitized (leading separator stripped, remaining separators
//! replaced with underscores, lowercased) and mapped to
//! `<data_dir>/<key>.json`. Saves replace the whole file; the `jobs` and
//! `workers` documents are written sequentially, so consistency between
//! them is only eventual.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot '{0}' not found")]
    NotFound(String),

    #[error("could not access snapshot file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not decode snapshot: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

pub struct SnapshotClient {
    data_dir: PathBuf,
}

fn transform(key: &str) -> String {
    key.trim_start_matches('/').replace('/', "_").to_lowercase()
}

impl SnapshotClient {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", transform(key)))
    }

    /// Load the document stored under `key`. A missing file is reported
    /// as [`SnapshotError::NotFound`], distinct from decode failures.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let filename = self.path_for(key);
        if !filename.exists() {
            return Err(SnapshotError::NotFound(key.to_string()));
        }
        let data = fs::read(&filename)?;
        let value = serde_json::from_slice(&data)?;
        debug!(key, path = %filename.display(), "Snapshot loaded");
        Ok(value)
    }

    /// Replace the document stored under `key` (truncate + write).
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let filename = self.path_for(key);
        let data = serde_json::to_vec(value)?;
        fs::write(&filename, data)?;
        debug!(key, path = %filename.display(), "Snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    use crate::job::{Job, NewJob};
    use crate::worker::Worker;

    #[test]
    fn test_key_transform() {
        assert_eq!(transform("jobs"), "jobs");
        assert_eq!(transform("/jobs"), "jobs");
        assert_eq!(transform("/Registry/Jobs"), "registry_jobs");
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let client = SnapshotClient::new(temp_dir.path());

        let now = chrono::Utc::now();
        let mut jobs = HashMap::new();
        let mut job = Job::create(
            "AB12CD34-0000-4000-8000-000000000001".to_string(),
            NewJob {
                download_url: "http://example.com/a.mkv".to_string(),
                name: "a".to_string(),
                ..NewJob::default()
            },
            now,
        );
        job.requested_at = Some(now);
        job.touch(now);
        jobs.insert(job.id.clone(), job);

        let mut workers = HashMap::new();
        let worker = Worker::seen("10.1.2.3".to_string(), "peskar-index/1.0".to_string(), now);
        workers.insert(worker.ip.clone(), worker);

        client.save("jobs", &jobs).unwrap();
        client.save("workers", &workers).unwrap();

        let loaded_jobs: HashMap<String, Job> = client.load("jobs").unwrap();
        let loaded_workers: HashMap<String, Worker> = client.load("workers").unwrap();

        assert_eq!(
            serde_json::to_value(&loaded_jobs).unwrap(),
            serde_json::to_value(&jobs).unwrap()
        );
        assert_eq!(
            serde_json::to_value(&loaded_workers).unwrap(),
            serde_json::to_value(&workers).unwrap()
        );
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let client = SnapshotClient::new(temp_dir.path());

        let result: Result<HashMap<String, Job>> = client.load("jobs");
        assert!(matches!(result, Err(SnapshotError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let temp_dir = TempDir::new().unwrap();
        let client = SnapshotClient::new(temp_dir.path());

        std::fs::write(temp_dir.path().join("jobs.json"), b"{not json").unwrap();

        let result: Result<HashMap<String, Job>> = client.load("jobs");
        assert!(matches!(result, Err(SnapshotError::Decode(_))));
    }

    #[test]
    fn test_save_replaces_previous_content() {
        let temp_dir = TempDir::new().unwrap();
        let client = SnapshotClient::new(temp_dir.path());

        client
            .save("jobs", &HashMap::from([("a".to_string(), 1u32)]))
            .unwrap();
        client
            .save("jobs", &HashMap::from([("b".to_string(), 2u32)]))
            .unwrap();

        let loaded: HashMap<String, u32> = client.load("jobs").unwrap();
        assert_eq!(loaded, HashMap::from([("b".to_string(), 2u32)]));
    }
}
