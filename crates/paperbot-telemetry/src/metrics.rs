//! Prometheus metrics for the paper-trading platform.
//!
//! Grounded structurally on the teacher's `metrics.rs`: one `Lazy`
//! static per Prometheus collector, registered at first access, with a
//! unit-struct `Metrics` facade exposing a named method per recorded
//! event so call sites never touch the `prometheus` API directly.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration
//! failure (e.g. a duplicate metric name) is a startup-time
//! configuration bug that should crash immediately, not fail silently.
//! These panics only occur during static initialization, never once
//! the process is running.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge_vec, CounterVec,
    HistogramVec, IntGaugeVec,
};

/// Signals persisted by the orchestrator. Labels: strategy, asset.
pub static SIGNALS_PERSISTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "paperbot_signals_persisted_total",
        "Total signals persisted by the orchestrator",
        &["strategy", "asset"]
    )
    .unwrap()
});

/// Signals consumed (acted on) by a paper engine. Labels: strategy, asset.
pub static SIGNALS_CONSUMED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "paperbot_signals_consumed_total",
        "Total signals consumed by a paper engine",
        &["strategy", "asset"]
    )
    .unwrap()
});

/// Positions opened. Labels: strategy, asset, direction.
pub static POSITIONS_OPENED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "paperbot_positions_opened_total",
        "Total paper positions opened",
        &["strategy", "asset", "direction"]
    )
    .unwrap()
});

/// Positions closed. Labels: strategy, asset, exit_reason.
pub static POSITIONS_CLOSED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "paperbot_positions_closed_total",
        "Total paper positions closed",
        &["strategy", "asset", "exit_reason"]
    )
    .unwrap()
});

/// Realised PnL per closed position. Labels: strategy, asset.
pub static REALISED_PNL: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "paperbot_realised_pnl",
        "Realised PnL per closed position",
        &["strategy", "asset"],
        vec![-1000.0, -500.0, -100.0, -50.0, -10.0, 0.0, 10.0, 50.0, 100.0, 500.0, 1000.0]
    )
    .unwrap()
});

/// Signals rejected by the risk subsystem. Labels: strategy, reason.
pub static RISK_REJECTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "paperbot_risk_rejections_total",
        "Total signals rejected by the risk subsystem",
        &["strategy", "reason"]
    )
    .unwrap()
});

/// Current open position count. Labels: account.
pub static OPEN_POSITIONS: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "paperbot_open_positions",
        "Current open position count per account",
        &["account"]
    )
    .unwrap()
});

/// Orchestrator tick duration in milliseconds.
pub static ORCHESTRATOR_TICK_DURATION_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "paperbot_orchestrator_tick_duration_ms",
        "Orchestrator tick wall-clock duration in milliseconds",
        &["asset"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Collector poll duration in milliseconds. Labels: venue.
pub static COLLECTOR_POLL_DURATION_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "paperbot_collector_poll_duration_ms",
        "Collector poll-loop iteration duration in milliseconds",
        &["venue"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Collector poll failures. Labels: venue.
pub static COLLECTOR_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "paperbot_collector_errors_total",
        "Total collector poll failures",
        &["venue"]
    )
    .unwrap()
});

/// Oracle price staleness in seconds at the moment of lookup. Labels: asset, exchange.
pub static ORACLE_PRICE_AGE_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "paperbot_oracle_price_age_seconds",
        "Oracle price age in seconds at lookup time",
        &["asset", "exchange"],
        vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    )
    .unwrap()
});

/// HTTP requests served by the read API. Labels: route, status.
pub static HTTP_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "paperbot_http_requests_total",
        "Total read API requests",
        &["route", "status"]
    )
    .unwrap()
});

/// Facade over the statics above so call sites never touch the
/// `prometheus` API directly.
pub struct Metrics;

impl Metrics {
    pub fn signal_persisted(strategy: &str, asset: &str) {
        SIGNALS_PERSISTED_TOTAL.with_label_values(&[strategy, asset]).inc();
    }

    pub fn signal_consumed(strategy: &str, asset: &str) {
        SIGNALS_CONSUMED_TOTAL.with_label_values(&[strategy, asset]).inc();
    }

    pub fn position_opened(strategy: &str, asset: &str, direction: &str) {
        POSITIONS_OPENED_TOTAL
            .with_label_values(&[strategy, asset, direction])
            .inc();
    }

    pub fn position_closed(strategy: &str, asset: &str, exit_reason: &str, realised_pnl: f64) {
        POSITIONS_CLOSED_TOTAL
            .with_label_values(&[strategy, asset, exit_reason])
            .inc();
        REALISED_PNL.with_label_values(&[strategy, asset]).observe(realised_pnl);
    }

    pub fn risk_rejected(strategy: &str, reason: &str) {
        RISK_REJECTIONS_TOTAL.with_label_values(&[strategy, reason]).inc();
    }

    pub fn open_positions(account: &str, count: i64) {
        OPEN_POSITIONS.with_label_values(&[account]).set(count);
    }

    pub fn orchestrator_tick(asset: &str, duration_ms: f64) {
        ORCHESTRATOR_TICK_DURATION_MS.with_label_values(&[asset]).observe(duration_ms);
    }

    pub fn collector_poll(venue: &str, duration_ms: f64) {
        COLLECTOR_POLL_DURATION_MS.with_label_values(&[venue]).observe(duration_ms);
    }

    pub fn collector_error(venue: &str) {
        COLLECTOR_ERRORS_TOTAL.with_label_values(&[venue]).inc();
    }

    pub fn oracle_price_age(asset: &str, exchange: &str, age_seconds: f64) {
        ORACLE_PRICE_AGE_SECONDS
            .with_label_values(&[asset, exchange])
            .observe(age_seconds);
    }

    pub fn http_request(route: &str, status: u16) {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_metrics_does_not_panic() {
        Metrics::signal_persisted("rsi_mean_reversion", "BTC");
        Metrics::signal_consumed("rsi_mean_reversion", "BTC");
        Metrics::position_opened("rsi_mean_reversion", "BTC", "LONG");
        Metrics::position_closed("rsi_mean_reversion", "BTC", "stop_loss", -12.5);
        Metrics::risk_rejected("rsi_mean_reversion", "cooldown");
        Metrics::open_positions("alpha-1", 3);
        Metrics::orchestrator_tick("BTC", 4.2);
        Metrics::collector_poll("hyperliquid", 11.0);
        Metrics::collector_error("hyperliquid");
        Metrics::oracle_price_age("BTC", "hyperliquid", 1.5);
        Metrics::http_request("/accounts", 200);
    }
}
