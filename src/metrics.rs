use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::freshness::lifespan;

pub const POSTED_TOTAL: &str = "notifications_posted_total";
pub const CLAIMS_TOTAL: &str = "claims_total";
pub const CLAIM_CONFLICTS_TOTAL: &str = "claim_conflicts_total";
pub const CLAIMS_EXPIRED_TOTAL: &str = "claims_expired_total";
pub const FEEDBACK_TOTAL: &str = "feedback_total";
pub const REPORTS_TOTAL: &str = "leftover_reports_total";
pub const POLL_VOTES_TOTAL: &str = "poll_votes_total";
pub const ACTIVE_GAUGE: &str = "notifications_active";
pub const CLAIMED_GAUGE: &str = "notifications_claimed";

static METRICS: OnceCell<Metrics> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process and return it.
    pub fn global() -> anyhow::Result<&'static Metrics> {
        METRICS.get_or_try_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;

            // Static gauge with the notification lifespan
            gauge!("food_lifespan_secs").set(lifespan().num_seconds() as f64);

            Ok(Metrics { handle })
        })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
