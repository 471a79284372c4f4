//! Pure metric computation functions, no store or I/O dependency.
//!
//! Grounded on `original_source/.../metrics/formulas.py`.

use serde::Serialize;

/// Aggregated metrics for a strategy, portfolio, or asset slice.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StrategyMetrics {
    pub total_trades: u32,
    pub wins: u32,
    pub total_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub avg_hold_minutes: f64,
}

/// Win rate as a percentage in `[0, 100]`.
pub fn win_rate(wins: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    wins as f64 / total as f64 * 100.0
}

/// Gross profit over gross loss. `gross_loss` should be a positive number.
pub fn profit_factor(gross_profit: f64, gross_loss: f64) -> f64 {
    if gross_loss <= 0.0 {
        return 0.0;
    }
    gross_profit / gross_loss
}

/// Expected value per trade: `wr * avg_win - (1 - wr) * |avg_loss|`.
pub fn expectancy(win_rate_pct: f64, avg_win: f64, avg_loss: f64) -> f64 {
    let wr = win_rate_pct / 100.0;
    wr * avg_win - (1.0 - wr) * avg_loss.abs()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (`ddof=1`).
fn sample_std(values: &[f64], mean_value: f64) -> f64 {
    let n = values.len() as f64;
    let variance = values.iter().map(|v| (v - mean_value).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Annualised Sharpe ratio using sample standard deviation.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let m = mean(returns);
    let std = sample_std(returns, m);
    if std == 0.0 {
        return 0.0;
    }
    m / std * 252f64.sqrt()
}

/// Annualised Sortino ratio using downside deviation (returns clamped to
/// the non-positive side before the sample standard deviation).
pub fn sortino_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let m = mean(returns);
    let downside: Vec<f64> = returns.iter().map(|v| v.min(0.0)).collect();
    let downside_mean = mean(&downside);
    let downside_std = sample_std(&downside, downside_mean);
    if downside_std == 0.0 {
        return 0.0;
    }
    m / downside_std * 252f64.sqrt()
}

/// Maximum drawdown across an equity series, as a percentage in `[0, 100]`.
pub fn max_drawdown(equity_series: &[f64]) -> f64 {
    if equity_series.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_series[0];
    let mut worst = 0.0f64;
    for &value in equity_series {
        if value > peak {
            peak = value;
        }
        let safe_peak = if peak == 0.0 { 1.0 } else { peak };
        let drawdown = (peak - value) / safe_peak;
        if drawdown > worst {
            worst = drawdown;
        }
    }
    worst * 100.0
}

/// Average hold time in minutes from a list of hold durations in seconds.
pub fn avg_hold_time_minutes(hold_times_seconds: &[f64]) -> f64 {
    if hold_times_seconds.is_empty() {
        return 0.0;
    }
    hold_times_seconds.iter().sum::<f64>() / hold_times_seconds.len() as f64 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_rate_handles_empty_total() {
        assert_eq!(win_rate(0, 0), 0.0);
    }

    #[test]
    fn win_rate_computes_percentage() {
        assert_eq!(win_rate(3, 10), 30.0);
    }

    #[test]
    fn profit_factor_zero_when_no_losses() {
        assert_eq!(profit_factor(100.0, 0.0), 0.0);
    }

    #[test]
    fn profit_factor_ratio() {
        assert_eq!(profit_factor(300.0, 100.0), 3.0);
    }

    #[test]
    fn expectancy_weighted_by_win_rate() {
        let e = expectancy(60.0, 100.0, -50.0);
        assert!((e - (0.6 * 100.0 - 0.4 * 50.0)).abs() < 1e-9);
    }

    #[test]
    fn sharpe_ratio_needs_at_least_two_points() {
        assert_eq!(sharpe_ratio(&[0.01]), 0.0);
    }

    #[test]
    fn sharpe_ratio_zero_when_no_variance() {
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01]), 0.0);
    }

    #[test]
    fn max_drawdown_tracks_worst_peak_to_trough() {
        let dd = max_drawdown(&[100.0, 120.0, 90.0, 110.0]);
        assert!((dd - 25.0).abs() < 1e-9);
    }

    #[test]
    fn max_drawdown_needs_at_least_two_points() {
        assert_eq!(max_drawdown(&[100.0]), 0.0);
    }

    #[test]
    fn avg_hold_time_converts_seconds_to_minutes() {
        assert_eq!(avg_hold_time_minutes(&[60.0, 120.0]), 1.5);
    }
}
