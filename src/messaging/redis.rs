//! Redis-backed message bus.
//!
//! Topics are Redis lists: publishing is a single `LPUSH`, consuming is
//! a blocking `RPOP` loop with a short block timeout so a cancellation
//! request is observed at the next delivered or awaited message.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime, Timeouts};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{MessageBus, Result};

/// How long one `BRPOP` blocks before the subscriber rechecks for
/// cancellation.
const POP_BLOCK: Duration = Duration::from_secs(1);

/// A process-wide Redis connection pool shared by publishers and the
/// subscriber loop.
#[derive(Clone)]
pub struct RedisBus {
    pool: Pool,
}

impl RedisBus {
    /// Build the pool. No connection is made until first use; call
    /// [`MessageBus::check`] at startup to fail fast.
    pub fn connect(addr: &str, max_idle: usize, idle_timeout: Duration) -> Result<Self> {
        let mut cfg = Config::from_url(addr);
        cfg.pool = Some(PoolConfig {
            max_size: max_idle,
            timeouts: Timeouts {
                wait: Some(idle_timeout),
                create: Some(idle_timeout),
                recycle: Some(idle_timeout),
            },
            ..Default::default()
        });
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }

    async fn pop(&self, topic: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.pool.get().await?;
        let reply: Option<(String, Vec<u8>)> =
            conn.brpop(topic, POP_BLOCK.as_secs_f64()).await?;
        Ok(reply.map(|(_, payload)| payload))
    }

    /// Consume `topic` until the token is cancelled, handing each
    /// payload to `callback`. Callback and transport errors are logged
    /// and the loop continues; the pool re-establishes connections on
    /// the next iteration.
    pub async fn run_subscriber<F, Fut, E>(
        &self,
        topic: &str,
        token: CancellationToken,
        mut callback: F,
    ) where
        F: FnMut(Vec<u8>) -> Fut + Send,
        Fut: std::future::Future<Output = std::result::Result<(), E>> + Send,
        E: std::fmt::Display,
    {
        info!(topic, "Subscribed");
        loop {
            let received = tokio::select! {
                _ = token.cancelled() => break,
                received = self.pop(topic) => received,
            };
            match received {
                Ok(Some(payload)) => {
                    if let Err(err) = callback(payload).await {
                        warn!(topic, error = %err, "Could not process received message");
                    }
                }
                Ok(None) => {} // block timeout, loop to observe cancellation
                Err(err) => {
                    warn!(topic, error = %err, "Receive failed");
                    tokio::time::sleep(POP_BLOCK).await;
                }
            }
        }
        info!(topic, "Subscription stopped");
    }
}

#[async_trait]
impl MessageBus for RedisBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.lpush(topic, payload).await?;
        Ok(())
    }

    async fn check(&self) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let _: String = deadpool_redis::redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
