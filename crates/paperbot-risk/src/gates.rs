//! Stateless position-and-exposure risk checks, plus the composite
//! gate that combines them with the stateful [`crate::RiskTracker`]
//! checks.
//!
//! Gate evaluation order (first failure short-circuits):
//! 1. daily loss pause, 2. cooldown, 3. max positions per strategy,
//! 4. max total exposure.

use crate::tracker::RiskTracker;
use chrono::{DateTime, Utc};
use paperbot_core::model::Position;
use rust_decimal::Decimal;

/// Result of a risk check: allowed, or rejected with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskVerdict {
    pub allowed: bool,
    pub reason: String,
}

impl RiskVerdict {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: String::new(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Reject if `strategy` already has `>= limit` open positions.
pub fn check_max_positions_per_strategy(
    strategy: &str,
    open_positions: &[Position],
    limit: u32,
) -> RiskVerdict {
    let count = open_positions.iter().filter(|p| p.strategy == strategy).count() as u32;
    if count >= limit {
        return RiskVerdict::reject(format!("max_positions_per_strategy ({count}/{limit})"));
    }
    RiskVerdict::allow()
}

/// Reject if total notional exposure (existing OPEN positions plus the
/// prospective new position) would exceed `limit_pct` of `equity`.
pub fn check_max_total_exposure(
    open_positions: &[Position],
    equity: Decimal,
    new_position_value: Decimal,
    limit_pct: Decimal,
) -> RiskVerdict {
    let current_exposure: Decimal = open_positions.iter().map(Position::entry_notional).sum();
    let total = current_exposure + new_position_value;
    let limit_value = equity * limit_pct;
    if total > limit_value {
        return RiskVerdict::reject(format!(
            "max_total_exposure ({total:.0}/{limit_value:.0})"
        ));
    }
    RiskVerdict::allow()
}

/// Configured risk limits, independent of per-strategy runtime state.
#[derive(Debug, Clone, Copy)]
pub struct RiskLimits {
    pub max_positions_per_strategy: u32,
    pub max_total_exposure_pct: Decimal,
}

/// Composite risk check. Runs the stateful daily-loss and cooldown
/// checks against `tracker` first, then the two stateless checks
/// above, returning the first rejecting verdict or an allow.
pub fn evaluate_risk(
    limits: RiskLimits,
    tracker: &mut RiskTracker,
    strategy: &str,
    open_positions: &[Position],
    equity: Decimal,
    new_position_value: Decimal,
    now: DateTime<Utc>,
) -> RiskVerdict {
    if tracker.is_strategy_paused(strategy, now) {
        return RiskVerdict::reject("daily_loss_limit_exceeded");
    }

    if tracker.is_in_cooldown(strategy, now) {
        return RiskVerdict::reject("cooldown_active");
    }

    let verdict =
        check_max_positions_per_strategy(strategy, open_positions, limits.max_positions_per_strategy);
    if !verdict.allowed {
        return verdict;
    }

    check_max_total_exposure(
        open_positions,
        equity,
        new_position_value,
        limits.max_total_exposure_pct,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use paperbot_core::decimal::{Price, Size};
    use paperbot_core::model::{Direction, PositionStatus};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn open_position(strategy: &str, entry: Decimal, qty: Decimal) -> Position {
        Position {
            id: Some(1),
            account_id: 1,
            strategy: strategy.to_string(),
            asset: "BTC".to_string(),
            venue: "hyperliquid".to_string(),
            direction: Direction::Long,
            entry_price: Price::new(entry),
            entry_ts: now(),
            quantity: Size::new(qty),
            exit_price: None,
            exit_ts: None,
            exit_reason: None,
            realised_pnl: None,
            status: PositionStatus::Open,
            signal_id: None,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn max_positions_blocks_at_limit() {
        let positions = vec![
            open_position("rsi_mean_reversion", dec!(100), dec!(1)),
            open_position("rsi_mean_reversion", dec!(100), dec!(1)),
            open_position("funding_rate", dec!(100), dec!(1)),
        ];
        let verdict = check_max_positions_per_strategy("rsi_mean_reversion", &positions, 2);
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason, "max_positions_per_strategy (2/2)");

        let verdict = check_max_positions_per_strategy("funding_rate", &positions, 2);
        assert!(verdict.allowed);
    }

    #[test]
    fn max_exposure_blocks_over_limit_pct() {
        let positions = vec![open_position("rsi_mean_reversion", dec!(50000), dec!(0.1))];
        // existing exposure = 5000; equity = 10000; limit 60% = 6000
        let verdict =
            check_max_total_exposure(&positions, dec!(10000), dec!(500), dec!(0.6));
        assert!(verdict.allowed);

        let verdict =
            check_max_total_exposure(&positions, dec!(10000), dec!(2000), dec!(0.6));
        assert!(!verdict.allowed);
    }

    #[test]
    fn evaluate_risk_short_circuits_in_order() {
        let limits = RiskLimits {
            max_positions_per_strategy: 3,
            max_total_exposure_pct: dec!(0.5),
        };
        let mut tracker = RiskTracker::new(dec!(100), 30);
        tracker.record_close("rsi_mean_reversion", dec!(-150), now());

        // daily loss pause fires before cooldown or position checks are reached
        let verdict = evaluate_risk(
            limits,
            &mut tracker,
            "rsi_mean_reversion",
            &[],
            dec!(10000),
            dec!(100),
            now() + Duration::minutes(1),
        );
        assert_eq!(verdict, RiskVerdict::reject("daily_loss_limit_exceeded"));

        // a strategy with no loss history and no open positions is allowed
        let verdict = evaluate_risk(
            limits,
            &mut tracker,
            "funding_rate",
            &[],
            dec!(10000),
            dec!(100),
            now(),
        );
        assert!(verdict.allowed);
    }

    #[test]
    fn evaluate_risk_cooldown_blocks_before_position_checks() {
        let limits = RiskLimits {
            max_positions_per_strategy: 3,
            max_total_exposure_pct: dec!(0.5),
        };
        let mut tracker = RiskTracker::new(dec!(10_000), 30);
        tracker.record_close("rsi_mean_reversion", dec!(-10), now());

        let verdict = evaluate_risk(
            limits,
            &mut tracker,
            "rsi_mean_reversion",
            &[],
            dec!(10000),
            dec!(100),
            now() + Duration::minutes(5),
        );
        assert_eq!(verdict, RiskVerdict::reject("cooldown_active"));
    }
}
