//! The `Strategy` trait every concrete strategy implements, plus its
//! descriptive metadata.

use paperbot_core::model::{MarketSnapshot, Signal};

/// Free-form prose describing a strategy's premise, data dependency,
/// and failure mode. Surfaced by the read API so an operator can see
/// *why* a strategy exists, not just its numeric thresholds.
#[derive(Debug, Clone, Default)]
pub struct StrategyDocs {
    pub thesis: &'static str,
    pub data: &'static str,
    pub risk: &'static str,
}

/// A single-pass scan over a [`MarketSnapshot`] that emits at most one
/// signal per call.
pub trait Strategy: Send + Sync {
    /// Unique, stable name used as the registry key and persisted on
    /// every emitted signal.
    fn name(&self) -> &'static str;

    /// Assets this strategy is applicable to.
    fn assets(&self) -> &'static [&'static str];

    /// Venue this strategy trades: `"hyperliquid"` or `"polymarket"`.
    fn exchange(&self) -> &'static str;

    /// Re-evaluation interval, e.g. `"1m"`, `"5m"`, `"10m"`.
    fn interval(&self) -> &'static str;

    /// Descriptive metadata for operator tooling.
    fn docs(&self) -> StrategyDocs;

    /// Evaluate one asset's market data, returning a signal to open a
    /// position or `None` to pass.
    fn evaluate(&self, snapshot: &MarketSnapshot) -> Option<Signal>;
}
