//! Background maintenance loops, all parked on one cancellation token.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::Scheduler;
use crate::snapshot::SnapshotClient;

const TICK: Duration = Duration::from_secs(60);
const FIRST_SAVE_AFTER: Duration = Duration::from_secs(15 * 60);
const SAVE_EVERY: Duration = Duration::from_secs(30 * 60);

impl Scheduler {
    /// Spawn the zombie-reclaim, worker-liveness and periodic-save
    /// loops. Cancelling the token stops all of them; the final
    /// shutdown save is the caller's responsibility.
    pub fn spawn_background(
        self: Arc<Self>,
        snapshots: Arc<SnapshotClient>,
        token: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        vec![
            tokio::spawn(zombie_loop(self.clone(), token.clone())),
            tokio::spawn(liveness_loop(self.clone(), token.clone())),
            tokio::spawn(save_loop(self, snapshots, token)),
        ]
    }
}

async fn zombie_loop(scheduler: Arc<Scheduler>, token: CancellationToken) {
    let mut ticker = tokio::time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // the first tick fires immediately
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let reclaimed = scheduler.reclaim_zombie_jobs().await;
                if reclaimed > 0 {
                    info!(reclaimed, "Requeued zombie jobs");
                }
            }
        }
    }
}

async fn liveness_loop(scheduler: Arc<Scheduler>, token: CancellationToken) {
    let mut ticker = tokio::time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let expired = scheduler.expire_silent_workers().await;
                if expired > 0 {
                    info!(expired, "Marked silent workers inactive");
                }
            }
        }
    }
}

/// First save lands 15 minutes after start, then one every 30 minutes.
async fn save_loop(
    scheduler: Arc<Scheduler>,
    snapshots: Arc<SnapshotClient>,
    token: CancellationToken,
) {
    tokio::select! {
        _ = token.cancelled() => return,
        _ = tokio::time::sleep(FIRST_SAVE_AFTER) => {}
    }
    loop {
        if let Err(err) = scheduler.persist(&snapshots).await {
            error!(error = %err, "Periodic save failed");
        }
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(SAVE_EVERY) => {}
        }
    }
}
