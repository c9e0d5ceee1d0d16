// src/config.rs
//! Process configuration read from the environment (after `.env`).

use std::path::PathBuf;

pub const ENV_SNAPSHOT_PATH: &str = "SNAPSHOT_PATH";
pub const ENV_SNAPSHOT_INTERVAL_SECS: &str = "SNAPSHOT_INTERVAL_SECS";
pub const ENV_METRICS_ENABLED: &str = "METRICS_ENABLED";

pub const DEFAULT_SNAPSHOT_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Where the notification snapshot lives; `None` keeps state in memory only.
    pub snapshot_path: Option<PathBuf>,
    pub snapshot_interval_secs: u64,
    pub metrics_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            snapshot_interval_secs: DEFAULT_SNAPSHOT_INTERVAL_SECS,
            metrics_enabled: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let snapshot_path = std::env::var(ENV_SNAPSHOT_PATH)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let snapshot_interval_secs = match std::env::var(ENV_SNAPSHOT_INTERVAL_SECS) {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(v) if v > 0 => v,
                _ => {
                    tracing::warn!(
                        target: "config",
                        value = %raw,
                        "invalid {ENV_SNAPSHOT_INTERVAL_SECS}, using default"
                    );
                    DEFAULT_SNAPSHOT_INTERVAL_SECS
                }
            },
            Err(_) => DEFAULT_SNAPSHOT_INTERVAL_SECS,
        };

        let metrics_enabled = std::env::var(ENV_METRICS_ENABLED)
            .ok()
            .is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes"));

        Self {
            snapshot_path,
            snapshot_interval_secs,
            metrics_enabled,
        }
    }
}
