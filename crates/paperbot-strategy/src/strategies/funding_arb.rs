//! Funding arbitrage: same rule as [`crate::strategies::funding::FundingRate`]
//! at a lower threshold, to capture more frequent, smaller edges.
//!
//! Grounded on `original_source/.../strategy/strategies/funding_arb.py`.

use crate::params::decimal_param;
use crate::strategy::{Strategy, StrategyDocs};
use paperbot_core::decimal::Price;
use paperbot_core::model::{Direction, MarketSnapshot, Signal};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use serde_json::Value as Json;
use std::collections::HashMap;

const ASSETS: &[&str] = &["BTC", "ETH", "SOL"];

pub struct FundingArb {
    threshold: Decimal,
}

impl FundingArb {
    pub fn new(threshold: Decimal) -> Self {
        Self { threshold }
    }

    /// Build from configured overrides, falling back to the default
    /// `threshold` when absent.
    pub fn from_params(params: &HashMap<String, Json>) -> Self {
        let default = Self::default();
        Self::new(decimal_param(params, "threshold", default.threshold))
    }
}

impl Default for FundingArb {
    fn default() -> Self {
        Self::new(Decimal::new(5, 4))
    }
}

impl Strategy for FundingArb {
    fn name(&self) -> &'static str {
        "funding_arb"
    }
    fn assets(&self) -> &'static [&'static str] {
        ASSETS
    }
    fn exchange(&self) -> &'static str {
        "hyperliquid"
    }
    fn interval(&self) -> &'static str {
        "1m"
    }
    fn docs(&self) -> StrategyDocs {
        StrategyDocs {
            thesis: "Collect funding by positioning against the dominant side at a lower threshold than funding_rate.",
            data: "Latest Hyperliquid funding snapshot.",
            risk: "Lower threshold means more trades with smaller edge; fee drag from higher turnover can outweigh funding collected.",
        }
    }
    fn evaluate(&self, snapshot: &MarketSnapshot) -> Option<Signal> {
        let latest = snapshot.funding.last()?;
        let rate = latest.funding_rate;

        let (direction, confidence) = if rate > self.threshold {
            (Direction::Short, (rate / (self.threshold * Decimal::from(4))).min(Decimal::ONE))
        } else if rate < -self.threshold {
            (Direction::Long, (-rate / (self.threshold * Decimal::from(4))).min(Decimal::ONE))
        } else {
            return None;
        };

        let entry_price = latest.mark_price.unwrap_or(Price::new(Decimal::ZERO));
        let mut metadata = HashMap::new();
        metadata.insert("funding_rate".to_string(), json!(rate.to_string()));
        metadata.insert("threshold".to_string(), json!(self.threshold.to_string()));

        Some(Signal::new(
            self.name(),
            snapshot.asset.clone(),
            "hyperliquid",
            direction,
            confidence.to_f64().unwrap_or(0.0),
            entry_price,
            metadata,
            snapshot.ts,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use paperbot_core::model::FundingSnapshot;
    use rust_decimal_macros::dec;

    fn snapshot_with_rate(rate: Decimal) -> MarketSnapshot {
        MarketSnapshot {
            asset: "ETH".to_string(),
            ts: Utc::now(),
            candles: vec![],
            funding: vec![FundingSnapshot {
                venue: "hyperliquid".to_string(),
                asset: "ETH".to_string(),
                ts: Utc::now(),
                funding_rate: rate,
                open_interest: None,
                mark_price: Some(Price::new(dec!(3000))),
            }],
            polymarket: vec![],
        }
    }

    #[test]
    fn fires_at_lower_threshold_than_funding_rate() {
        let strat = FundingArb::default();
        // 0.0006 would not trigger FundingRate's 0.0012 threshold
        let signal = strat.evaluate(&snapshot_with_rate(dec!(0.0006))).unwrap();
        assert_eq!(signal.direction, Direction::Short);
    }

    #[test]
    fn passes_inside_band() {
        let strat = FundingArb::default();
        assert!(strat.evaluate(&snapshot_with_rate(dec!(0.0001))).is_none());
    }
}
