//! RSI mean-reversion: fade overbought/oversold readings on perps.
//!
//! Grounded on `original_source/.../strategy/strategies/rsi.py`.

use crate::indicators::rsi;
use crate::params::{decimal_param, usize_param};
use crate::strategy::{Strategy, StrategyDocs};
use paperbot_core::model::{Direction, MarketSnapshot, Signal};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use serde_json::Value as Json;
use std::collections::HashMap;

const ASSETS: &[&str] = &["BTC", "ETH", "SOL"];

pub struct RSIMeanReversion {
    period: usize,
    overbought: Decimal,
    oversold: Decimal,
}

impl RSIMeanReversion {
    pub fn new(period: usize, overbought: Decimal, oversold: Decimal) -> Self {
        Self {
            period,
            overbought,
            oversold,
        }
    }

    /// Build from configured overrides, falling back to the default
    /// `period`/`overbought`/`oversold` for any key not present in `params`.
    pub fn from_params(params: &HashMap<String, Json>) -> Self {
        let default = Self::default();
        Self::new(
            usize_param(params, "period", default.period),
            decimal_param(params, "overbought", default.overbought),
            decimal_param(params, "oversold", default.oversold),
        )
    }
}

impl Default for RSIMeanReversion {
    fn default() -> Self {
        Self::new(14, Decimal::from(75), Decimal::from(25))
    }
}

impl Strategy for RSIMeanReversion {
    fn name(&self) -> &'static str {
        "rsi_mean_reversion"
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
            thesis: "Fade overbought/oversold RSI readings on Hyperliquid perps as momentum exhausts.",
            data: "5m candle close prices fed into a 14-period Wilder RSI.",
            risk: "RSI can stay overbought/oversold through strong trends, causing early entries against the trend.",
        }
    }
    fn evaluate(&self, snapshot: &MarketSnapshot) -> Option<Signal> {
        if snapshot.candles.is_empty() {
            return None;
        }
        let closes: Vec<_> = snapshot.candles.iter().map(|c| c.close).collect();
        let value = rsi(&closes, self.period)?;

        let (direction, confidence) = if value > self.overbought {
            let confidence = (value - self.overbought) / (Decimal::from(100) - self.overbought);
            (Direction::Short, confidence.min(Decimal::ONE))
        } else if value < self.oversold {
            let confidence = (self.oversold - value) / self.oversold;
            (Direction::Long, confidence.min(Decimal::ONE))
        } else {
            return None;
        };

        let entry_price = *closes.last().expect("checked non-empty above");
        let mut metadata = HashMap::new();
        metadata.insert("rsi".to_string(), json!(value.round_dp(2).to_string()));
        metadata.insert("period".to_string(), json!(self.period));
        metadata.insert("overbought".to_string(), json!(self.overbought.to_string()));
        metadata.insert("oversold".to_string(), json!(self.oversold.to_string()));

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
    use paperbot_core::decimal::{Price, Size};
    use paperbot_core::model::Candle;
    use rust_decimal_macros::dec;

    fn snapshot_with_closes(closes: &[i64]) -> MarketSnapshot {
        MarketSnapshot {
            asset: "BTC".to_string(),
            ts: Utc::now(),
            candles: closes
                .iter()
                .map(|c| Candle {
                    venue: "hyperliquid".to_string(),
                    asset: "BTC".to_string(),
                    interval: "5m".to_string(),
                    open_time: Utc::now(),
                    open: Price::new(Decimal::from(*c)),
                    high: Price::new(Decimal::from(*c)),
                    low: Price::new(Decimal::from(*c)),
                    close: Price::new(Decimal::from(*c)),
                    volume: Size::new(dec!(1)),
                })
                .collect(),
            funding: vec![],
            polymarket: vec![],
        }
    }

    #[test]
    fn shorts_when_overbought() {
        let strat = RSIMeanReversion::default();
        let closes: Vec<i64> = (1..=20).collect();
        let signal = strat.evaluate(&snapshot_with_closes(&closes)).unwrap();
        assert_eq!(signal.direction, Direction::Short);
    }

    #[test]
    fn no_signal_with_insufficient_candles() {
        let strat = RSIMeanReversion::default();
        let signal = strat.evaluate(&snapshot_with_closes(&[1, 2, 3]));
        assert!(signal.is_none());
    }
}
