//! JSON response types for the read API.
//!
//! Domain rows (`Position`, `Signal`, `Account`, `AccountMarkToMarket`)
//! already derive `Serialize` and are returned as-is; these types cover
//! only the aggregated/computed shapes the raw rows don't carry.

use chrono::{DateTime, Utc};
use paperbot_metrics::StrategyMetrics;
use rust_decimal::Decimal;
use serde::Serialize;

/// One row of `GET /accounts`.
#[derive(Debug, Clone, Serialize)]
pub struct AccountListEntry {
    pub name: String,
    pub venue: String,
    pub strategy: String,
    pub active: bool,
    pub initial_capital: Decimal,
    pub current_equity: Decimal,
}

/// `GET /accounts/:name/summary`.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub name: String,
    pub initial_capital: Decimal,
    pub current_equity: Decimal,
    pub realised_pnl: Decimal,
    pub unrealised_pnl: Decimal,
    pub open_position_count: i64,
}

/// `GET /accounts/:name/positions`.
#[derive(Debug, Clone, Serialize)]
pub struct AccountPositions {
    pub open: Vec<paperbot_core::model::Position>,
    pub closed: Vec<paperbot_core::model::Position>,
}

/// One point of a `GET /portfolios/:name/summary` equity curve.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioEquityPoint {
    pub ts: DateTime<Utc>,
    pub total_equity: Decimal,
}

/// `GET /portfolios/:name/summary`.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummary {
    pub name: String,
    pub member_accounts: Vec<String>,
    pub equity_curve: Vec<PortfolioEquityPoint>,
}

/// `GET /assets/:symbol/performance`, one entry per strategy that has
/// traded the asset.
#[derive(Debug, Clone, Serialize)]
pub struct AssetStrategyPerformance {
    pub strategy: String,
    pub metrics: StrategyMetrics,
}

/// `GET /assets/:symbol/performance`.
#[derive(Debug, Clone, Serialize)]
pub struct AssetPerformance {
    pub asset: String,
    pub by_strategy: Vec<AssetStrategyPerformance>,
}

/// `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub store_reachable: bool,
    pub oracle_running: bool,
}
