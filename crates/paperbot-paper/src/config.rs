//! Paper engine configuration, deserialized from the `paper` config
//! section.
//!
//! Grounded on `original_source/.../config/schema.py::PaperConfig`,
//! supplemented with the slippage/fee/oracle fields the schema's later
//! revision adds.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    pub initial_capital: Decimal,
    pub risk_pct: Decimal,
    pub default_stop_loss_pct: Decimal,
    pub default_take_profit_pct: Decimal,
    pub default_timeout_minutes: i64,

    // Risk controls, consumed by `paperbot_risk`.
    pub max_positions_per_strategy: u32,
    pub max_total_exposure_pct: Decimal,
    pub max_daily_loss_per_strategy: Decimal,
    pub cooldown_after_loss_minutes: i64,

    // Kelly criterion sizing.
    pub kelly_enabled: bool,
    pub kelly_safety_factor: f64,
    pub kelly_base_win_prob: f64,

    // Per-venue slippage and fee rates, e.g. {"hyperliquid": 0.0005}.
    pub slippage_pct: HashMap<String, f64>,
    pub fee_pct: HashMap<String, f64>,

    pub price_oracle_enabled: bool,
    pub price_oracle_staleness_s: u64,
}

impl PaperConfig {
    pub fn slippage_for(&self, venue: &str) -> f64 {
        self.slippage_pct.get(venue).copied().unwrap_or(0.0)
    }

    pub fn fee_for(&self, venue: &str) -> f64 {
        self.fee_pct.get(venue).copied().unwrap_or(0.0)
    }
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(10000),
            risk_pct: dec!(0.02),
            default_stop_loss_pct: dec!(0.02),
            default_take_profit_pct: dec!(0.04),
            default_timeout_minutes: 60,
            max_positions_per_strategy: 3,
            max_total_exposure_pct: dec!(0.50),
            max_daily_loss_per_strategy: dec!(500),
            cooldown_after_loss_minutes: 5,
            kelly_enabled: true,
            kelly_safety_factor: 0.5,
            kelly_base_win_prob: 0.5,
            slippage_pct: HashMap::new(),
            fee_pct: HashMap::new(),
            price_oracle_enabled: true,
            price_oracle_staleness_s: 30,
        }
    }
}
