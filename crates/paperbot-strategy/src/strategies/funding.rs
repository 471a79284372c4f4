//! Hyperliquid funding-rate strategies: fade extreme funding, and a
//! dual-filter variant that also requires elevated open interest.
//!
//! Grounded on `original_source/.../strategy/strategies/funding.py`.

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

/// Fade extreme perpetual funding rates: longs paying high funding are
/// over-leveraged and tend to correct (and vice versa).
pub struct FundingRate {
    threshold: Decimal,
}

impl FundingRate {
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

impl Default for FundingRate {
    fn default() -> Self {
        Self::new(Decimal::new(12, 4))
    }
}

impl Strategy for FundingRate {
    fn name(&self) -> &'static str {
        "funding_rate"
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
            thesis: "Fade extreme funding rates on perpetual futures; over-leveraged side tends to correct.",
            data: "Latest Hyperliquid funding snapshot, compared against a configurable threshold.",
            risk: "Funding can stay elevated during strong trends; position may stop out before reversion plays out.",
        }
    }
    fn evaluate(&self, snapshot: &MarketSnapshot) -> Option<Signal> {
        let latest = snapshot.funding.last()?;
        let rate = latest.funding_rate;

        let (direction, confidence) = if rate > self.threshold {
            (Direction::Short, (rate / (self.threshold * Decimal::from(3))).min(Decimal::ONE))
        } else if rate < -self.threshold {
            (Direction::Long, (-rate / (self.threshold * Decimal::from(3))).min(Decimal::ONE))
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

/// Extreme funding plus extreme open interest: maximum squeeze setup.
/// Both conditions must hold.
pub struct FundingOI {
    funding_threshold: Decimal,
    oi_pct: Decimal,
}

impl FundingOI {
    pub fn new(funding_threshold: Decimal, oi_pct: Decimal) -> Self {
        Self {
            funding_threshold,
            oi_pct,
        }
    }

    /// Build from configured overrides, falling back to the default
    /// `funding_threshold`/`oi_pct` for any key not present in `params`.
    pub fn from_params(params: &HashMap<String, Json>) -> Self {
        let default = Self::default();
        Self::new(
            decimal_param(params, "funding_threshold", default.funding_threshold),
            decimal_param(params, "oi_pct", default.oi_pct),
        )
    }
}

impl Default for FundingOI {
    fn default() -> Self {
        Self::new(Decimal::new(15, 4), Decimal::from(85))
    }
}

impl Strategy for FundingOI {
    fn name(&self) -> &'static str {
        "funding_oi"
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
            thesis: "Extreme funding combined with high open interest signals maximum squeeze potential.",
            data: "Hyperliquid funding rate and open interest; OI compared to the max over the snapshot window.",
            risk: "Dual filter reduces signal frequency; squeeze timing is uncertain even when both conditions hold.",
        }
    }
    fn evaluate(&self, snapshot: &MarketSnapshot) -> Option<Signal> {
        let latest = snapshot.funding.last()?;
        let rate = latest.funding_rate;
        let current_oi = latest.open_interest?;

        let oi_values: Vec<Decimal> = snapshot.funding.iter().filter_map(|f| f.open_interest).collect();
        let max_oi = oi_values.into_iter().fold(Decimal::ZERO, Decimal::max);
        if max_oi.is_zero() {
            return None;
        }
        let oi_ratio = current_oi / max_oi * Decimal::from(100);

        let abs_rate = rate.abs();
        if abs_rate <= self.funding_threshold || oi_ratio <= self.oi_pct {
            return None;
        }

        let direction = if rate > Decimal::ZERO { Direction::Short } else { Direction::Long };
        let confidence = ((abs_rate / (self.funding_threshold * Decimal::from(2))) * (oi_ratio / Decimal::from(100)))
            .min(Decimal::ONE);
        let entry_price = latest.mark_price.unwrap_or(Price::new(Decimal::ZERO));

        let mut metadata = HashMap::new();
        metadata.insert("funding_rate".to_string(), json!(rate.to_string()));
        metadata.insert("oi_ratio".to_string(), json!(oi_ratio.round_dp(1).to_string()));
        metadata.insert("current_oi".to_string(), json!(current_oi.to_string()));
        metadata.insert("max_oi".to_string(), json!(max_oi.to_string()));
        metadata.insert("funding_threshold".to_string(), json!(self.funding_threshold.to_string()));
        metadata.insert("oi_pct".to_string(), json!(self.oi_pct.to_string()));

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

    fn snapshot_with_funding(rates_and_oi: &[(Decimal, Option<Decimal>)]) -> MarketSnapshot {
        MarketSnapshot {
            asset: "BTC".to_string(),
            ts: Utc::now(),
            candles: vec![],
            funding: rates_and_oi
                .iter()
                .map(|(rate, oi)| FundingSnapshot {
                    venue: "hyperliquid".to_string(),
                    asset: "BTC".to_string(),
                    ts: Utc::now(),
                    funding_rate: *rate,
                    open_interest: *oi,
                    mark_price: Some(Price::new(dec!(60000))),
                })
                .collect(),
            polymarket: vec![],
        }
    }

    #[test]
    fn funding_rate_shorts_above_threshold() {
        let strat = FundingRate::default();
        let snapshot = snapshot_with_funding(&[(dec!(0.002), None)]);
        let signal = strat.evaluate(&snapshot).unwrap();
        assert_eq!(signal.direction, Direction::Short);
    }

    #[test]
    fn funding_rate_longs_below_negative_threshold() {
        let strat = FundingRate::default();
        let snapshot = snapshot_with_funding(&[(dec!(-0.002), None)]);
        let signal = strat.evaluate(&snapshot).unwrap();
        assert_eq!(signal.direction, Direction::Long);
    }

    #[test]
    fn funding_rate_passes_inside_band() {
        let strat = FundingRate::default();
        let snapshot = snapshot_with_funding(&[(dec!(0.0001), None)]);
        assert!(strat.evaluate(&snapshot).is_none());
    }

    #[test]
    fn funding_oi_requires_both_conditions() {
        let strat = FundingOI::default();
        // funding above threshold but OI ratio low (50%)
        let snapshot = snapshot_with_funding(&[
            (dec!(0.001), Some(dec!(1000))),
            (dec!(0.002), Some(dec!(500))),
        ]);
        assert!(strat.evaluate(&snapshot).is_none());
    }

    #[test]
    fn funding_oi_fires_when_both_extreme() {
        let strat = FundingOI::default();
        let snapshot = snapshot_with_funding(&[
            (dec!(0.001), Some(dec!(1000))),
            (dec!(0.002), Some(dec!(950))),
        ]);
        let signal = strat.evaluate(&snapshot).unwrap();
        assert_eq!(signal.direction, Direction::Short);
    }
}
