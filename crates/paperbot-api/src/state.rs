//! Shared state handed to every axum handler.

use paperbot_metrics::{MetricsCache, StrategyMetrics};
use sqlx::PgPool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const METRICS_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub metrics_cache: Arc<MetricsCache<StrategyMetrics>>,
    oracle_running: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            metrics_cache: Arc::new(MetricsCache::new(METRICS_CACHE_TTL)),
            oracle_running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Called by the oracle task whenever its run loop starts or stops,
    /// so `/health` reflects live status.
    pub fn set_oracle_running(&self, running: bool) {
        self.oracle_running.store(running, Ordering::Relaxed);
    }

    pub fn oracle_running(&self) -> bool {
        self.oracle_running.load(Ordering::Relaxed)
    }
}
