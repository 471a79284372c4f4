//! Exit condition checking for open paper positions: stop-loss,
//! take-profit, and timeout, in that priority order.
//!
//! Grounded structurally on the teacher's `ExitWatcher` (a pure
//! condition check separate from the mechanics of acting on it) and
//! in content on `original_source/.../paper/engine.py::check_exits`.

use chrono::{DateTime, Duration, Utc};
use paperbot_core::model::{Direction, ExitReason, Position};
use rust_decimal::Decimal;

/// Stop-loss and take-profit trigger prices for a position, given its
/// entry price and the configured percentage distances.
pub fn stop_price(direction: Direction, entry_price: Decimal, stop_loss_pct: Decimal) -> Decimal {
    match direction {
        Direction::Long => entry_price * (Decimal::ONE - stop_loss_pct),
        Direction::Short => entry_price * (Decimal::ONE + stop_loss_pct),
    }
}

pub fn take_profit_price(direction: Direction, entry_price: Decimal, take_profit_pct: Decimal) -> Decimal {
    match direction {
        Direction::Long => entry_price * (Decimal::ONE + take_profit_pct),
        Direction::Short => entry_price * (Decimal::ONE - take_profit_pct),
    }
}

/// Check whether `position` should exit at `current_price` and `now`.
/// Priority: stop-loss, then take-profit, then timeout. Returns `None`
/// if no exit condition is met.
#[allow(clippy::too_many_arguments)]
pub fn check_exit(
    position: &Position,
    current_price: Decimal,
    stop_loss_pct: Decimal,
    take_profit_pct: Decimal,
    timeout: Duration,
    now: DateTime<Utc>,
) -> Option<ExitReason> {
    let entry = position.entry_price.inner();
    let stop = stop_price(position.direction, entry, stop_loss_pct);
    let tp = take_profit_price(position.direction, entry, take_profit_pct);

    match position.direction {
        Direction::Long => {
            if current_price <= stop {
                return Some(ExitReason::StopLoss);
            }
            if current_price >= tp {
                return Some(ExitReason::TakeProfit);
            }
        }
        Direction::Short => {
            if current_price >= stop {
                return Some(ExitReason::StopLoss);
            }
            if current_price <= tp {
                return Some(ExitReason::TakeProfit);
            }
        }
    }

    if now - position.entry_ts >= timeout {
        return Some(ExitReason::Timeout);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperbot_core::decimal::{Price, Size};
    use paperbot_core::model::PositionStatus;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn position(direction: Direction, entry: Decimal, entry_ts: DateTime<Utc>) -> Position {
        Position {
            id: Some(1),
            account_id: 1,
            strategy: "test".to_string(),
            asset: "BTC".to_string(),
            venue: "hyperliquid".to_string(),
            direction,
            entry_price: Price::new(entry),
            entry_ts,
            quantity: Size::new(dec!(1)),
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
    fn long_stop_loss_triggers() {
        let now = Utc::now();
        let pos = position(Direction::Long, dec!(100), now);
        let reason = check_exit(&pos, dec!(97), dec!(0.02), dec!(0.04), Duration::minutes(60), now);
        assert_eq!(reason, Some(ExitReason::StopLoss));
    }

    #[test]
    fn long_take_profit_triggers() {
        let now = Utc::now();
        let pos = position(Direction::Long, dec!(100), now);
        let reason = check_exit(&pos, dec!(105), dec!(0.02), dec!(0.04), Duration::minutes(60), now);
        assert_eq!(reason, Some(ExitReason::TakeProfit));
    }

    #[test]
    fn short_stop_loss_and_take_profit_are_mirrored() {
        let now = Utc::now();
        let pos = position(Direction::Short, dec!(100), now);
        assert_eq!(
            check_exit(&pos, dec!(103), dec!(0.02), dec!(0.04), Duration::minutes(60), now),
            Some(ExitReason::StopLoss)
        );
        assert_eq!(
            check_exit(&pos, dec!(95), dec!(0.02), dec!(0.04), Duration::minutes(60), now),
            Some(ExitReason::TakeProfit)
        );
    }

    #[test]
    fn timeout_triggers_when_no_price_exit_and_held_too_long() {
        let entry_ts = Utc::now() - Duration::minutes(90);
        let pos = position(Direction::Long, dec!(100), entry_ts);
        let reason = check_exit(&pos, dec!(100.5), dec!(0.02), dec!(0.04), Duration::minutes(60), Utc::now());
        assert_eq!(reason, Some(ExitReason::Timeout));
    }

    #[test]
    fn no_exit_when_within_bounds_and_held_time() {
        let now = Utc::now();
        let pos = position(Direction::Long, dec!(100), now);
        let reason = check_exit(&pos, dec!(100.5), dec!(0.02), dec!(0.04), Duration::minutes(60), now);
        assert_eq!(reason, None);
    }

    #[test]
    fn stop_loss_takes_priority_over_timeout() {
        let entry_ts = Utc::now() - Duration::minutes(90);
        let pos = position(Direction::Long, dec!(100), entry_ts);
        let reason = check_exit(&pos, dec!(97), dec!(0.02), dec!(0.04), Duration::minutes(60), Utc::now());
        assert_eq!(reason, Some(ExitReason::StopLoss));
    }
}
