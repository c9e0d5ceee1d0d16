//! Food board service binary entrypoint.
//! Boots the Axum HTTP server on Shuttle, wiring routes, shared state and the
//! snapshot/gauge scheduler.

use std::sync::Arc;

use grub_guardians::clock::SystemClock;
use grub_guardians::scheduler::{spawn_snapshot_scheduler, SnapshotSchedulerCfg};
use grub_guardians::Runtime;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - GRUB_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("GRUB_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("grub_guardians=info,board=info,warn"));

    // Shuttle may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let runtime = Runtime::from_env(Arc::new(SystemClock)).await?;

    spawn_snapshot_scheduler(
        SnapshotSchedulerCfg {
            interval_secs: runtime.config.snapshot_interval_secs,
            path: runtime.config.snapshot_path.clone(),
        },
        runtime.board.clone(),
        runtime.store.clone(),
        runtime.clock.clone(),
    );

    let router = runtime.router()?;
    Ok(router.into())
}
