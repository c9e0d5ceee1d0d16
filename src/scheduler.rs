// src/scheduler.rs
use std::path::PathBuf;
use std::sync::Arc;

use metrics::gauge;
use tokio::task::JoinHandle;

use crate::board::FoodBoard;
use crate::clock::Clock;
use crate::lifecycle;
use crate::metrics::{ACTIVE_GAUGE, CLAIMED_GAUGE};
use crate::store::MemoryStore;

#[derive(Clone, Debug)]
pub struct SnapshotSchedulerCfg {
    pub interval_secs: u64,
    pub path: Option<PathBuf>,
}

/// Spawn a ticker that publishes board gauges and, when a path is set,
/// writes the store snapshot. Failures are logged and retried next tick.
pub fn spawn_snapshot_scheduler(
    cfg: SnapshotSchedulerCfg,
    board: Arc<FoodBoard>,
    store: Arc<MemoryStore>,
    clock: Arc<dyn Clock>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs.max(1)));
        loop {
            ticker.tick().await;
            tick_once(&cfg, &board, &store, clock.now()).await;
        }
    })
}

async fn tick_once(
    cfg: &SnapshotSchedulerCfg,
    board: &FoodBoard,
    store: &MemoryStore,
    now: chrono::DateTime<chrono::Utc>,
) {
    match board.all().await {
        Ok(all) => {
            let active = lifecycle::active(&all, now).count();
            let claimed = all.iter().filter(|n| n.is_claimed()).count();
            gauge!(ACTIVE_GAUGE).set(active as f64);
            gauge!(CLAIMED_GAUGE).set(claimed as f64);
            tracing::debug!(target: "scheduler", active, claimed, "board tick");
        }
        Err(e) => tracing::warn!(target: "scheduler", "board tick failed: {e:#}"),
    }

    if let Some(path) = &cfg.path {
        if let Err(e) = store.save_snapshot(path).await {
            tracing::warn!(target: "scheduler", path = %path.display(), "snapshot write failed: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::NewNotification;
    use crate::clock::SystemClock;
    use crate::location::LocationDirectory;

    #[tokio::test]
    async fn tick_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notifications.json");
        let store = Arc::new(MemoryStore::new());
        let board = FoodBoard::new(store.clone(), LocationDirectory::campus_seed());
        let now = SystemClock.now();
        board.post(NewNotification::new("Idli").at("hA"), now).await.unwrap();

        let cfg = SnapshotSchedulerCfg {
            interval_secs: 1,
            path: Some(path.clone()),
        };
        tick_once(&cfg, &board, &store, now).await;

        let back = MemoryStore::load_snapshot(&path).await.unwrap();
        assert_eq!(back.len(), 1);
    }
}
