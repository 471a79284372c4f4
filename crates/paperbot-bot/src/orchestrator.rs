//! Strategy orchestrator: ticks every few seconds, builds a market
//! snapshot per configured asset, and evaluates every applicable
//! strategy against it on its own interval.
//!
//! Grounded on `original_source/.../orchestrator/runner.py::run` for
//! the tick/rate-limit shape and `orchestrator/snapshot.py` for the
//! snapshot builder call.

use paperbot_store::market_data::{build_snapshot, SnapshotWindow};
use paperbot_strategy::registry::StrategyRegistry;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const TICK_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_INTERVAL_SECONDS: i64 = 60;

/// Maps a strategy's `interval()` string to a cooldown in seconds.
/// Unknown interval strings fall back to one minute, logging a
/// one-time warning the first time they're seen.
fn interval_seconds(interval: &str, warned: &mut std::collections::HashSet<String>) -> i64 {
    match interval {
        "1m" => 60,
        "5m" => 300,
        "10m" => 600,
        "15m" => 900,
        "1h" => 3600,
        other => {
            if warned.insert(other.to_string()) {
                warn!(interval = other, "unknown strategy interval, defaulting to 60s");
            }
            DEFAULT_INTERVAL_SECONDS
        }
    }
}

/// Drive the orchestrator tick loop until `cancel` fires. Evaluates
/// every enabled strategy against every asset it trades, subject to a
/// per-(strategy, asset) rate limiter keyed by the strategy's own
/// interval. The limiter lives only in memory and resets on restart.
pub async fn run(
    pool: PgPool,
    assets: Vec<String>,
    registry: StrategyRegistry,
    cancel: CancellationToken,
) {
    info!(assets = assets.len(), strategies = registry.len(), "orchestrator_started");

    let mut last_run: HashMap<(String, String), chrono::DateTime<chrono::Utc>> = HashMap::new();
    let mut warned_intervals = std::collections::HashSet::new();

    loop {
        tick(&pool, &assets, &registry, &mut last_run, &mut warned_intervals).await;

        tokio::select! {
            _ = tokio::time::sleep(TICK_INTERVAL) => {}
            _ = cancel.cancelled() => break,
        }
    }
    info!("orchestrator_stopped");
}

async fn tick(
    pool: &PgPool,
    assets: &[String],
    registry: &StrategyRegistry,
    last_run: &mut HashMap<(String, String), chrono::DateTime<chrono::Utc>>,
    warned_intervals: &mut std::collections::HashSet<String>,
) {
    let now = chrono::Utc::now();

    for asset in assets {
        let tick_start = std::time::Instant::now();
        let applicable: Vec<_> = registry.iter().filter(|s| s.assets().contains(&asset.as_str())).collect();
        if applicable.is_empty() {
            continue;
        }

        let snapshot = match build_snapshot(pool, asset, SnapshotWindow::default()).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(asset, error = %e, "snapshot_build_failed");
                continue;
            }
        };

        for strategy in applicable {
            let key = (strategy.name().to_string(), asset.clone());
            let cooldown = interval_seconds(strategy.interval(), warned_intervals);
            if let Some(last) = last_run.get(&key) {
                if (now - *last).num_seconds() < cooldown {
                    continue;
                }
            }
            last_run.insert(key, now);

            let Some(signal) = strategy.evaluate(&snapshot) else {
                debug!(strategy = strategy.name(), asset, "no_signal");
                continue;
            };

            match paperbot_store::signals::persist_signal(pool, &signal).await {
                Ok(id) => {
                    paperbot_telemetry::Metrics::signal_persisted(strategy.name(), asset);
                    info!(signal_id = id, strategy = strategy.name(), asset, direction = ?signal.direction, "signal_persisted");
                }
                Err(e) => error!(strategy = strategy.name(), asset, error = %e, "signal_persist_failed"),
            }
        }

        paperbot_telemetry::Metrics::orchestrator_tick(asset, tick_start.elapsed().as_secs_f64() * 1000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_intervals_map_to_seconds() {
        let mut warned = std::collections::HashSet::new();
        assert_eq!(interval_seconds("1m", &mut warned), 60);
        assert_eq!(interval_seconds("5m", &mut warned), 300);
        assert_eq!(interval_seconds("10m", &mut warned), 600);
        assert_eq!(interval_seconds("15m", &mut warned), 900);
        assert_eq!(interval_seconds("1h", &mut warned), 3600);
        assert!(warned.is_empty());
    }

    #[test]
    fn unknown_interval_defaults_and_warns_once() {
        let mut warned = std::collections::HashSet::new();
        assert_eq!(interval_seconds("2h", &mut warned), DEFAULT_INTERVAL_SECONDS);
        assert!(warned.contains("2h"));
        // second call for the same unknown interval should not re-insert
        assert_eq!(interval_seconds("2h", &mut warned), DEFAULT_INTERVAL_SECONDS);
        assert_eq!(warned.len(), 1);
    }
}
