//! Momentum breakout: Bollinger Band breakout confirmed by a volume spike.
//!
//! Grounded on `original_source/.../strategy/strategies/momentum.py`.

use crate::indicators::bollinger_bands;
use crate::params::{decimal_param, usize_param};
use crate::strategy::{Strategy, StrategyDocs};
use paperbot_core::model::{Direction, MarketSnapshot, Signal};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use serde_json::Value as Json;
use std::collections::HashMap;

const ASSETS: &[&str] = &["BTC", "ETH", "SOL"];

pub struct MomentumBreakout {
    bb_period: usize,
    bb_std: Decimal,
    volume_mult: Decimal,
}

impl MomentumBreakout {
    pub fn new(bb_period: usize, bb_std: Decimal, volume_mult: Decimal) -> Self {
        Self {
            bb_period,
            bb_std,
            volume_mult,
        }
    }

    /// Build from configured overrides, falling back to the default
    /// `bb_period`/`bb_std`/`volume_mult` for any key not present in `params`.
    pub fn from_params(params: &HashMap<String, Json>) -> Self {
        let default = Self::default();
        Self::new(
            usize_param(params, "bb_period", default.bb_period),
            decimal_param(params, "bb_std", default.bb_std),
            decimal_param(params, "volume_mult", default.volume_mult),
        )
    }
}

impl Default for MomentumBreakout {
    fn default() -> Self {
        Self::new(20, Decimal::from(2), Decimal::new(15, 1))
    }
}

impl Strategy for MomentumBreakout {
    fn name(&self) -> &'static str {
        "momentum_breakout"
    }
    fn assets(&self) -> &'static [&'static str] {
        ASSETS
    }
    fn exchange(&self) -> &'static str {
        "hyperliquid"
    }
    fn interval(&self) -> &'static str {
        "5m"
    }
    fn docs(&self) -> StrategyDocs {
        StrategyDocs {
            thesis: "Enter on Bollinger Band breakouts confirmed by a volume spike, signalling genuine momentum over noise.",
            data: "5m candles: close prices for Bollinger Bands (20-period, 2 std) and volume for the multiplier filter.",
            risk: "False breakouts are common; volume confirmation reduces but does not eliminate them. Ranging markets whipsaw.",
        }
    }
    fn evaluate(&self, snapshot: &MarketSnapshot) -> Option<Signal> {
        if snapshot.candles.len() < self.bb_period {
            return None;
        }
        let closes: Vec<_> = snapshot.candles.iter().map(|c| c.close).collect();
        let (lower, middle, upper) = bollinger_bands(&closes, self.bb_period, self.bb_std)?;

        let latest = snapshot.candles.last().expect("checked len above");
        let price = latest.close.inner();

        let window = &snapshot.candles[snapshot.candles.len() - self.bb_period..];
        let total_volume: Decimal = window.iter().map(|c| c.volume.inner()).sum();
        let avg_volume = total_volume / Decimal::from(self.bb_period as u64);
        if avg_volume.is_zero() {
            return None;
        }
        if latest.volume.inner() <= self.volume_mult * avg_volume {
            return None;
        }

        let (direction, confidence) = if price > upper {
            let band_width = upper - middle;
            let confidence = if band_width.is_zero() {
                Decimal::ZERO
            } else {
                ((price - upper) / band_width).min(Decimal::ONE)
            };
            (Direction::Long, confidence)
        } else if price < lower {
            let band_width = middle - lower;
            let confidence = if band_width.is_zero() {
                Decimal::ZERO
            } else {
                ((lower - price) / band_width).min(Decimal::ONE)
            };
            (Direction::Short, confidence)
        } else {
            return None;
        };

        let mut metadata = HashMap::new();
        metadata.insert("bb_lower".to_string(), json!(lower.round_dp(2).to_string()));
        metadata.insert("bb_middle".to_string(), json!(middle.round_dp(2).to_string()));
        metadata.insert("bb_upper".to_string(), json!(upper.round_dp(2).to_string()));
        metadata.insert("volume".to_string(), json!(latest.volume.inner().to_string()));
        metadata.insert("avg_volume".to_string(), json!(avg_volume.round_dp(2).to_string()));

        Some(Signal::new(
            self.name(),
            snapshot.asset.clone(),
            "hyperliquid",
            direction,
            confidence.to_f64().unwrap_or(0.0),
            latest.close,
            metadata,
            snapshot.ts,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use paperbot_core::decimal::{Price, Size};
    use paperbot_core::model::Candle;
    use rust_decimal_macros::dec;

    fn candle(close: Decimal, volume: Decimal) -> Candle {
        Candle {
            venue: "hyperliquid".to_string(),
            asset: "BTC".to_string(),
            interval: "5m".to_string(),
            open_time: Utc::now(),
            open: Price::new(close),
            high: Price::new(close),
            low: Price::new(close),
            close: Price::new(close),
            volume: Size::new(volume),
        }
    }

    fn snapshot(candles: Vec<Candle>) -> MarketSnapshot {
        MarketSnapshot {
            asset: "BTC".to_string(),
            ts: Utc::now(),
            candles,
            funding: vec![],
            polymarket: vec![],
        }
    }

    #[test]
    fn no_signal_below_period_length() {
        let strat = MomentumBreakout::default();
        let candles = vec![candle(dec!(100), dec!(1)); 5];
        assert!(strat.evaluate(&snapshot(candles)).is_none());
    }

    #[test]
    fn fires_long_on_upper_breakout_with_volume() {
        let strat = MomentumBreakout::default();
        let mut candles: Vec<Candle> = (0..19).map(|_| candle(dec!(100), dec!(10))).collect();
        candles.push(candle(dec!(130), dec!(50)));
        let signal = strat.evaluate(&snapshot(candles)).unwrap();
        assert_eq!(signal.direction, Direction::Long);
    }

    #[test]
    fn no_signal_without_volume_confirmation() {
        let strat = MomentumBreakout::default();
        let mut candles: Vec<Candle> = (0..19).map(|_| candle(dec!(100), dec!(10))).collect();
        candles.push(candle(dec!(130), dec!(11)));
        assert!(strat.evaluate(&snapshot(candles)).is_none());
    }
}
