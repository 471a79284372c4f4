//! Polymarket contrarian strategies: bet against prediction-market
//! consensus once it passes a threshold.
//!
//! Grounded on `original_source/.../strategy/strategies/contrarian.py`.

use crate::params::{decimal_param, i64_param};
use crate::strategy::{Strategy, StrategyDocs};
use chrono::Utc;
use paperbot_core::decimal::Price;
use paperbot_core::model::{Direction, MarketSnapshot, PredictionMarketObservation, Signal};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use serde_json::Value as Json;
use std::collections::HashMap;

const ASSETS: &[&str] = &["BTC", "ETH", "SOL"];

/// Candidate signal for one market: its direction and confidence
/// against `threshold`, or `None` if `yes_price` sits inside the band.
fn candidate(market: &PredictionMarketObservation, threshold: Decimal) -> Option<(Direction, Decimal)> {
    let yes = market.yes_price?;
    if yes > threshold {
        Some((Direction::Short, ((yes - threshold) / (Decimal::ONE - threshold)).min(Decimal::ONE)))
    } else if yes < Decimal::ONE - threshold {
        Some((Direction::Long, (((Decimal::ONE - threshold) - yes) / (Decimal::ONE - threshold)).min(Decimal::ONE)))
    } else {
        None
    }
}

/// Skip markets closing within `min_days` of the snapshot; markets
/// with no known close date are never skipped since there is nothing
/// to compare against.
fn closing_too_soon(market: &PredictionMarketObservation, snapshot_ts: chrono::DateTime<Utc>, min_days: i64) -> bool {
    match market.end_date {
        Some(end_date) => (end_date - snapshot_ts).num_days() < min_days,
        None => false,
    }
}

/// Scan every Polymarket observation in the snapshot, skip markets
/// closing within `min_days`, and fire on whichever eligible market
/// produces the highest-confidence signal (first-seen wins on a tie).
fn evaluate_contrarian(
    name: &'static str,
    threshold: Decimal,
    min_days: i64,
    snapshot: &MarketSnapshot,
) -> Option<Signal> {
    let mut best: Option<(&PredictionMarketObservation, Direction, Decimal)> = None;
    for market in &snapshot.polymarket {
        if closing_too_soon(market, snapshot.ts, min_days) {
            continue;
        }
        let Some((direction, confidence)) = candidate(market, threshold) else {
            continue;
        };
        if best.as_ref().map(|(_, _, best_confidence)| confidence > *best_confidence).unwrap_or(true) {
            best = Some((market, direction, confidence));
        }
    }
    let (market, direction, confidence) = best?;
    let yes = market.yes_price?;

    let mut metadata = HashMap::new();
    metadata.insert("market_id".to_string(), json!(market.market_id));
    metadata.insert("market_title".to_string(), json!(market.market_title));
    metadata.insert("yes_price".to_string(), json!(yes.to_string()));
    metadata.insert("threshold".to_string(), json!(threshold.to_string()));

    Some(Signal::new(
        name,
        snapshot.asset.clone(),
        "polymarket",
        direction,
        confidence.to_f64().unwrap_or(0.0),
        Price::new(yes),
        metadata,
        snapshot.ts,
    ))
}

/// Bet against consensus once `yes_price` crosses 72% (or its mirror
/// at 28%). The lower of the two thresholds in the contrarian pair.
pub struct ContrarianPure {
    threshold: Decimal,
    min_days: i64,
}

impl ContrarianPure {
    pub fn new(threshold: Decimal, min_days: i64) -> Self {
        Self { threshold, min_days }
    }

    /// Build from configured overrides, falling back to the default
    /// `threshold`/`min_days` for any key not present in `params`.
    pub fn from_params(params: &HashMap<String, Json>) -> Self {
        let default = Self::default();
        Self::new(
            decimal_param(params, "threshold", default.threshold),
            i64_param(params, "min_days", default.min_days),
        )
    }
}

impl Default for ContrarianPure {
    fn default() -> Self {
        Self::new(Decimal::new(72, 2), 1)
    }
}

impl Strategy for ContrarianPure {
    fn name(&self) -> &'static str {
        "contrarian_pure"
    }
    fn assets(&self) -> &'static [&'static str] {
        ASSETS
    }
    fn exchange(&self) -> &'static str {
        "polymarket"
    }
    fn interval(&self) -> &'static str {
        "10m"
    }
    fn docs(&self) -> StrategyDocs {
        StrategyDocs {
            thesis: "Bet against consensus when prediction-market probability exceeds a threshold.",
            data: "Latest Polymarket yes_price for the asset's crypto-price market.",
            risk: "Consensus can remain extreme for a long time; no stop beyond the engine's own exit rules.",
        }
    }
    fn evaluate(&self, snapshot: &MarketSnapshot) -> Option<Signal> {
        evaluate_contrarian(self.name(), self.threshold, self.min_days, snapshot)
    }
}

/// Higher-bar contrarian: only fires on very strong consensus (80%).
pub struct ContrarianStrength {
    threshold: Decimal,
    min_days: i64,
}

impl ContrarianStrength {
    pub fn new(threshold: Decimal, min_days: i64) -> Self {
        Self { threshold, min_days }
    }

    /// Build from configured overrides, falling back to the default
    /// `threshold`/`min_days` for any key not present in `params`.
    pub fn from_params(params: &HashMap<String, Json>) -> Self {
        let default = Self::default();
        Self::new(
            decimal_param(params, "threshold", default.threshold),
            i64_param(params, "min_days", default.min_days),
        )
    }
}

impl Default for ContrarianStrength {
    fn default() -> Self {
        Self::new(Decimal::new(80, 2), 1)
    }
}

impl Strategy for ContrarianStrength {
    fn name(&self) -> &'static str {
        "contrarian_strength"
    }
    fn assets(&self) -> &'static [&'static str] {
        ASSETS
    }
    fn exchange(&self) -> &'static str {
        "polymarket"
    }
    fn interval(&self) -> &'static str {
        "10m"
    }
    fn docs(&self) -> StrategyDocs {
        StrategyDocs {
            thesis: "Higher-bar contrarian bet, only firing on very strong (80%+) consensus.",
            data: "Latest Polymarket yes_price for the asset's crypto-price market.",
            risk: "Fewer signals than contrarian_pure; when it does fire the underlying consensus is harder to dislodge.",
        }
    }
    fn evaluate(&self, snapshot: &MarketSnapshot) -> Option<Signal> {
        evaluate_contrarian(self.name(), self.threshold, self.min_days, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperbot_core::model::PredictionMarketObservation;
    use rust_decimal_macros::dec;

    fn snapshot_with_yes(yes: Decimal) -> MarketSnapshot {
        MarketSnapshot {
            asset: "BTC".to_string(),
            ts: Utc::now(),
            candles: vec![],
            funding: vec![],
            polymarket: vec![PredictionMarketObservation {
                market_id: "m1".to_string(),
                market_title: "Will BTC hit 100k?".to_string(),
                asset: "BTC".to_string(),
                ts: Utc::now(),
                yes_price: Some(yes),
                no_price: Some(Decimal::ONE - yes),
                volume_24h: None,
                liquidity: None,
                end_date: None,
            }],
        }
    }

    #[test]
    fn pure_shorts_on_high_consensus() {
        let strat = ContrarianPure::default();
        let signal = strat.evaluate(&snapshot_with_yes(dec!(0.90))).unwrap();
        assert_eq!(signal.direction, Direction::Short);
    }

    #[test]
    fn pure_longs_on_low_consensus() {
        let strat = ContrarianPure::default();
        let signal = strat.evaluate(&snapshot_with_yes(dec!(0.10))).unwrap();
        assert_eq!(signal.direction, Direction::Long);
    }

    #[test]
    fn pure_passes_inside_band() {
        let strat = ContrarianPure::default();
        assert!(strat.evaluate(&snapshot_with_yes(dec!(0.5))).is_none());
    }

    #[test]
    fn strength_requires_higher_bar() {
        let strat = ContrarianStrength::default();
        // 75% would fire contrarian_pure but not contrarian_strength
        assert!(strat.evaluate(&snapshot_with_yes(dec!(0.75))).is_none());
        assert!(strat.evaluate(&snapshot_with_yes(dec!(0.85))).is_some());
    }

    fn market(id: &str, yes: Decimal, end_date: Option<chrono::DateTime<Utc>>) -> PredictionMarketObservation {
        PredictionMarketObservation {
            market_id: id.to_string(),
            market_title: format!("market {id}"),
            asset: "BTC".to_string(),
            ts: Utc::now(),
            yes_price: Some(yes),
            no_price: Some(Decimal::ONE - yes),
            volume_24h: None,
            liquidity: None,
            end_date,
        }
    }

    #[test]
    fn skips_markets_closing_within_min_days() {
        let strat = ContrarianPure::new(dec!(0.72), 3);
        let snapshot = MarketSnapshot {
            asset: "BTC".to_string(),
            ts: Utc::now(),
            candles: vec![],
            funding: vec![],
            polymarket: vec![market("soon", dec!(0.95), Some(Utc::now() + chrono::Duration::days(1)))],
        };
        assert!(strat.evaluate(&snapshot).is_none());
    }

    #[test]
    fn does_not_skip_markets_with_unknown_close_date() {
        let strat = ContrarianPure::new(dec!(0.72), 3);
        let snapshot = MarketSnapshot {
            asset: "BTC".to_string(),
            ts: Utc::now(),
            candles: vec![],
            funding: vec![],
            polymarket: vec![market("unknown", dec!(0.95), None)],
        };
        assert!(strat.evaluate(&snapshot).is_some());
    }

    #[test]
    fn picks_highest_confidence_among_eligible_markets() {
        let strat = ContrarianPure::new(dec!(0.72), 0);
        let now = Utc::now();
        let snapshot = MarketSnapshot {
            asset: "BTC".to_string(),
            ts: now,
            candles: vec![],
            funding: vec![],
            polymarket: vec![
                market("low_confidence", dec!(0.80), Some(now + chrono::Duration::days(30))),
                market("high_confidence", dec!(0.97), Some(now + chrono::Duration::days(30))),
                market("inside_band", dec!(0.5), Some(now + chrono::Duration::days(30))),
            ],
        };
        let signal = strat.evaluate(&snapshot).unwrap();
        assert_eq!(signal.metadata.get("market_id").unwrap().as_str().unwrap(), "high_confidence");
    }

    #[test]
    fn no_signal_without_polymarket_data() {
        let strat = ContrarianPure::default();
        let snapshot = MarketSnapshot {
            asset: "BTC".to_string(),
            ts: Utc::now(),
            candles: vec![],
            funding: vec![],
            polymarket: vec![],
        };
        assert!(strat.evaluate(&snapshot).is_none());
    }
}
