//! Domain model shared by the whole workspace: candles, funding
//! snapshots, prediction-market observations, signals, accounts,
//! positions, and mark-to-market rows.

use crate::decimal::{Price, Size};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Trade direction. LONG profits when price rises, SHORT when it falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for LONG, -1 for SHORT. Used directly in PnL arithmetic.
    pub fn sign(self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => -Decimal::ONE,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

impl FromStr for Direction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LONG" => Ok(Direction::Long),
            "SHORT" => Ok(Direction::Short),
            other => Err(CoreError::InvalidDirection(other.to_string())),
        }
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Signal,
    StopLoss,
    TakeProfit,
    Timeout,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::Signal => "signal",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Timeout => "timeout",
        };
        write!(f, "{s}")
    }
}

/// Position lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// One OHLCV candlestick bar. `(venue, asset, interval, open_time)` is
/// the natural (unique) key; rows are immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub venue: String,
    pub asset: String,
    pub interval: String,
    pub open_time: DateTime<Utc>,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Size,
}

/// A point-in-time funding-rate observation. `(venue, asset, ts)` is
/// the natural key; rows are immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingSnapshot {
    pub venue: String,
    pub asset: String,
    pub ts: DateTime<Utc>,
    pub funding_rate: Decimal,
    pub open_interest: Option<Decimal>,
    pub mark_price: Option<Price>,
}

/// A snapshot of a binary-outcome prediction market. `(market_id, ts)`
/// is the natural key; rows are immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMarketObservation {
    pub market_id: String,
    pub market_title: String,
    pub asset: String,
    pub ts: DateTime<Utc>,
    pub yes_price: Option<Decimal>,
    pub no_price: Option<Decimal>,
    pub volume_24h: Option<Decimal>,
    pub liquidity: Option<Decimal>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Pre-fetched bundle of market data for one asset, passed to strategies.
/// Candles and funding/prediction-market rows are ordered oldest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub asset: String,
    pub ts: DateTime<Utc>,
    pub candles: Vec<Candle>,
    pub funding: Vec<FundingSnapshot>,
    pub polymarket: Vec<PredictionMarketObservation>,
}

/// A trading signal emitted by a strategy. Mutated exactly once by
/// the paper engine to flip `acted_on` false → true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: Option<i64>,
    pub ts: DateTime<Utc>,
    pub strategy: String,
    pub asset: String,
    pub exchange: String,
    pub direction: Direction,
    pub confidence: f64,
    pub entry_price: Price,
    pub metadata: HashMap<String, Json>,
    pub acted_on: bool,
}

impl Signal {
    /// Build a fresh, not-yet-persisted signal (no id, `acted_on = false`).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        strategy: impl Into<String>,
        asset: impl Into<String>,
        exchange: impl Into<String>,
        direction: Direction,
        confidence: f64,
        entry_price: Price,
        metadata: HashMap<String, Json>,
        ts: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            ts,
            strategy: strategy.into(),
            asset: asset.into(),
            exchange: exchange.into(),
            direction,
            confidence: confidence.clamp(0.0, 1.0),
            entry_price,
            metadata,
            acted_on: false,
        }
    }
}

/// A paper-trading account. One [`crate::model::Account`] maps to one
/// paper engine instance, scoped to its `(venue, strategy)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Option<i64>,
    pub name: String,
    pub venue: String,
    pub strategy: String,
    pub initial_capital: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub metadata: HashMap<String, Json>,
}

/// A named bag of accounts used for equity aggregation only; carries
/// no independent capital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioGroup {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A `(portfolio_group, account)` membership. Unique per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioMembership {
    pub portfolio_group_id: i64,
    pub account_id: i64,
}

/// An open or closed paper-trading position.
///
/// Invariant: a closed position has all of `exit_price, exit_ts,
/// exit_reason, realised_pnl` set and `status = Closed`; an open
/// position has none of them and `status = Open`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: Option<i64>,
    pub account_id: i64,
    pub strategy: String,
    pub asset: String,
    pub venue: String,
    pub direction: Direction,
    pub entry_price: Price,
    pub entry_ts: DateTime<Utc>,
    pub quantity: Size,
    pub exit_price: Option<Price>,
    pub exit_ts: Option<DateTime<Utc>>,
    pub exit_reason: Option<ExitReason>,
    pub realised_pnl: Option<Decimal>,
    pub status: PositionStatus,
    pub signal_id: Option<i64>,
    pub metadata: HashMap<String, Json>,
}

impl Position {
    /// Notional value at the stored (slippage-adjusted) entry price.
    pub fn entry_notional(&self) -> Decimal {
        self.quantity.notional(self.entry_price)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, PositionStatus::Open)
    }
}

/// Append-only per-account valuation snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountMarkToMarket {
    pub account_id: i64,
    pub ts: DateTime<Utc>,
    pub total_equity: Decimal,
    pub unrealised_pnl: Decimal,
    pub realised_pnl: Decimal,
    pub open_positions: i64,
    pub breakdown: HashMap<String, Json>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn direction_sign() {
        assert_eq!(Direction::Long.sign(), Decimal::ONE);
        assert_eq!(Direction::Short.sign(), -Decimal::ONE);
    }

    #[test]
    fn direction_round_trips_through_str() {
        assert_eq!("LONG".parse::<Direction>().unwrap(), Direction::Long);
        assert_eq!("SHORT".parse::<Direction>().unwrap(), Direction::Short);
        assert!("UP".parse::<Direction>().is_err());
    }

    #[test]
    fn position_entry_notional() {
        let pos = Position {
            id: None,
            account_id: 1,
            strategy: "rsi_mean_reversion".into(),
            asset: "BTC".into(),
            venue: "hyperliquid".into(),
            direction: Direction::Long,
            entry_price: Price::new(dec!(60000)),
            entry_ts: Utc::now(),
            quantity: Size::new(dec!(0.1667)),
            exit_price: None,
            exit_ts: None,
            exit_reason: None,
            realised_pnl: None,
            status: PositionStatus::Open,
            signal_id: None,
            metadata: HashMap::new(),
        };
        assert_eq!(pos.entry_notional(), dec!(10002.0000));
    }
}
