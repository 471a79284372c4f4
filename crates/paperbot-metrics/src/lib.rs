//! Pure performance metrics for strategies, portfolios, and assets.
//!
//! No store or network dependency: callers fetch positions and equity
//! rows via `paperbot-store` and hand them to [`compute_strategy_metrics`].
//! A [`MetricsCache`] sits in front of the (comparatively expensive)
//! computation when exposed through the read API.

pub mod cache;
pub mod compute;
pub mod formulas;

pub use cache::MetricsCache;
pub use compute::compute_strategy_metrics;
pub use formulas::StrategyMetrics;
