// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod scheduler;

// Notification lifecycle engine
pub mod freshness;
pub mod lifecycle;
pub mod notification;

// Proximity ranking
pub mod geo;
pub mod location;
pub mod ranking;

// Board service over a store and a clock
pub mod analytics;
pub mod board;
pub mod clock;
pub mod store;

// Student side: menu feedback, leftover reports, polls
pub mod community;
pub mod feedback;
pub mod poll;
pub mod report;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::board::{FoodBoard, NewNotification};
pub use crate::error::{BoardError, CommunityError, LifecycleError, StoreError};
pub use crate::freshness::{evaluate_freshness, Freshness, FreshnessTier};
pub use crate::lifecycle::{claim, count_claimed_on_day, create, is_active};
pub use crate::notification::{FoodNotification, NotificationId};
pub use crate::ranking::{rank, Distance, RankedLocation};

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::location::load_locations_default;
use crate::store::MemoryStore;

/// Everything the binary wires together.
pub struct Runtime {
    pub config: AppConfig,
    pub store: Arc<MemoryStore>,
    pub board: Arc<FoodBoard>,
    pub clock: Arc<dyn Clock>,
}

impl Runtime {
    /// Load locations and the snapshot (if configured) from the environment.
    pub async fn from_env(clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let directory = load_locations_default().context("loading locations")?;

        let store = match &config.snapshot_path {
            Some(p) => MemoryStore::load_snapshot(p)
                .await
                .with_context(|| format!("loading snapshot {}", p.display()))?,
            None => MemoryStore::new(),
        };
        let store = Arc::new(store);
        let board = Arc::new(FoodBoard::new(store.clone(), directory));

        tracing::info!(
            target: "config",
            locations = board.directory().len(),
            records = store.len(),
            snapshot = config.snapshot_path.is_some(),
            metrics = config.metrics_enabled,
            "runtime ready"
        );

        Ok(Self {
            config,
            store,
            board,
            clock,
        })
    }

    /// The full HTTP app, including `/metrics` when enabled.
    pub fn router(&self) -> anyhow::Result<Router> {
        let state = AppState::new(self.board.clone(), self.clock.clone());
        let mut app = api::router(state);
        if self.config.metrics_enabled {
            app = app.merge(crate::metrics::Metrics::global()?.router());
        }
        Ok(app)
    }
}

/// Build the in-process app from the environment with the system clock.
pub async fn app() -> anyhow::Result<Router> {
    Runtime::from_env(Arc::new(SystemClock)).await?.router()
}
