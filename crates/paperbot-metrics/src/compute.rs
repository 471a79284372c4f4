//! Builds a [`StrategyMetrics`] from closed positions and an equity
//! series. Kept separate from `formulas` so the pure math stays
//! testable without constructing domain types.

use crate::formulas::{
    avg_hold_time_minutes, expectancy, max_drawdown, profit_factor, sharpe_ratio, sortino_ratio,
    win_rate, StrategyMetrics,
};
use paperbot_core::model::Position;
use rust_decimal::prelude::ToPrimitive;

/// Compute aggregated metrics from a strategy's closed positions and an
/// equity series (e.g. mark-to-market `total_equity` values ordered by
/// time). Positions with no `realised_pnl` are ignored, since a closed
/// position should always carry one; an empty slice of positions and an
/// equity series shorter than two points both degrade to the formulas'
/// own zero-value defaults.
pub fn compute_strategy_metrics(positions: &[Position], equity_series: &[f64]) -> StrategyMetrics {
    let pnls: Vec<f64> = positions
        .iter()
        .filter_map(|p| p.realised_pnl)
        .filter_map(|pnl| pnl.to_f64())
        .collect();

    let total_trades = pnls.len() as u32;
    let wins = pnls.iter().filter(|&&pnl| pnl > 0.0).count() as u32;
    let total_pnl: f64 = pnls.iter().sum();

    let gross_profit: f64 = pnls.iter().filter(|&&pnl| pnl > 0.0).sum();
    let gross_loss: f64 = pnls.iter().filter(|&&pnl| pnl < 0.0).map(|pnl| pnl.abs()).sum();

    let win_count = wins.max(1) as f64;
    let loss_count = (total_trades - wins).max(1) as f64;
    let avg_win = if wins > 0 { gross_profit / win_count } else { 0.0 };
    let avg_loss = if total_trades > wins { -(gross_loss / loss_count) } else { 0.0 };

    let win_rate_pct = win_rate(wins, total_trades);

    let hold_times_seconds: Vec<f64> = positions
        .iter()
        .filter_map(|p| p.exit_ts.map(|exit_ts| (exit_ts - p.entry_ts).num_seconds() as f64))
        .collect();

    StrategyMetrics {
        total_trades,
        wins,
        total_pnl,
        avg_win,
        avg_loss,
        win_rate: win_rate_pct,
        profit_factor: profit_factor(gross_profit, gross_loss),
        expectancy: expectancy(win_rate_pct, avg_win, avg_loss),
        sharpe_ratio: sharpe_ratio(&pnls),
        sortino_ratio: sortino_ratio(&pnls),
        max_drawdown: max_drawdown(equity_series),
        avg_hold_minutes: avg_hold_time_minutes(&hold_times_seconds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use paperbot_core::decimal::{Price, Size};
    use paperbot_core::model::{Direction, ExitReason, PositionStatus};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn closed_position(pnl: rust_decimal::Decimal, hold_minutes: i64) -> Position {
        let entry_ts = Utc::now() - Duration::minutes(hold_minutes);
        Position {
            id: Some(1),
            account_id: 1,
            strategy: "rsi_mean_reversion".to_string(),
            asset: "BTC".to_string(),
            venue: "hyperliquid".to_string(),
            direction: Direction::Long,
            entry_price: Price::new(dec!(100)),
            entry_ts,
            quantity: Size::new(dec!(1)),
            exit_price: Some(Price::new(dec!(101))),
            exit_ts: Some(entry_ts + Duration::minutes(hold_minutes)),
            exit_reason: Some(ExitReason::Signal),
            realised_pnl: Some(pnl),
            status: PositionStatus::Closed,
            signal_id: None,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn empty_input_yields_zeroed_metrics() {
        let metrics = compute_strategy_metrics(&[], &[]);
        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.win_rate, 0.0);
    }

    #[test]
    fn mixed_wins_and_losses_compute_rates_and_pnl() {
        let positions = vec![
            closed_position(dec!(50), 30),
            closed_position(dec!(-20), 10),
            closed_position(dec!(30), 60),
        ];
        let metrics = compute_strategy_metrics(&positions, &[1000.0, 1050.0, 1030.0, 1060.0]);
        assert_eq!(metrics.total_trades, 3);
        assert_eq!(metrics.wins, 2);
        assert!((metrics.total_pnl - 60.0).abs() < 1e-9);
        assert!((metrics.win_rate - (2.0 / 3.0 * 100.0)).abs() < 1e-9);
        assert!(metrics.avg_hold_minutes > 0.0);
    }
}
