//! Message bus abstraction.
//!
//! The hub publishes user-initiated job transitions on the `jobs` topic
//! and consumes indexer log lines from the `index` topic. The concrete
//! transport is Redis ([`RedisBus`]); tests inject a [`MockBus`].

mod redis;

pub use self::redis::RedisBus;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

/// Topic carrying full job snapshots for user-initiated transitions.
pub const TOPIC_JOBS: &str = "jobs";
/// Topic the external indexer streams per-job log items on.
pub const TOPIC_INDEX: &str = "index";

#[derive(Debug, Error)]
pub enum BusError {
    #[error("could not create connection pool: {0}")]
    CreatePool(#[from] deadpool_redis::CreatePoolError),

    #[error("could not obtain connection: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    #[error("redis command failed: {0}")]
    Redis(#[from] ::redis::RedisError),
}

pub type Result<T> = std::result::Result<T, BusError>;

/// Producer side of the bus. Publication is best-effort: callers log
/// failures and move on, nothing is retried.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Encode and push a payload onto the named topic.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()>;

    /// Health probe; an error means the bus is unreachable.
    async fn check(&self) -> Result<()>;
}

/// Mock bus recording every publish, for tests.
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    published: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageBus for MockBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        tracing::info!(topic, size = payload.len(), "Mock publish");
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }

    async fn check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_bus_records_publishes() {
        let bus = MockBus::new();
        bus.publish(TOPIC_JOBS, b"{}".to_vec()).await.unwrap();
        bus.publish(TOPIC_JOBS, b"{\"id\":\"x\"}".to_vec()).await.unwrap();

        let published = bus.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0, "jobs");
        assert_eq!(published[1].1, b"{\"id\":\"x\"}".to_vec());
    }

    #[tokio::test]
    async fn test_mock_bus_check_is_healthy() {
        assert!(MockBus::new().check().await.is_ok());
    }
}
