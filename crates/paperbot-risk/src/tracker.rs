//! Per-strategy risk state: daily P&L accumulation and post-loss
//! cooldown. In-memory only, rebuilt on restart.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Accumulated risk state for one strategy, reset at UTC midnight.
#[derive(Debug, Clone)]
struct StrategyState {
    daily_loss: Decimal,
    daily_wins: Decimal,
    last_loss_ts: Option<DateTime<Utc>>,
    day_key: String,
}

impl Default for StrategyState {
    fn default() -> Self {
        Self {
            daily_loss: Decimal::ZERO,
            daily_wins: Decimal::ZERO,
            last_loss_ts: None,
            day_key: String::new(),
        }
    }
}

/// In-memory per-strategy risk tracker. Resets on process restart.
pub struct RiskTracker {
    max_daily_loss_per_strategy: Decimal,
    cooldown_after_loss: Duration,
    states: HashMap<String, StrategyState>,
}

impl RiskTracker {
    pub fn new(max_daily_loss_per_strategy: Decimal, cooldown_after_loss_minutes: i64) -> Self {
        Self {
            max_daily_loss_per_strategy,
            cooldown_after_loss: Duration::minutes(cooldown_after_loss_minutes),
            states: HashMap::new(),
        }
    }

    fn state_mut(&mut self, strategy: &str, now: DateTime<Utc>) -> &mut StrategyState {
        let today = now.format("%Y-%m-%d").to_string();
        let state = self.states.entry(strategy.to_string()).or_default();
        if state.day_key != today {
            state.daily_loss = Decimal::ZERO;
            state.daily_wins = Decimal::ZERO;
            state.day_key = today;
        }
        state
    }

    /// Record a position close: accumulate daily P&L and, on a loss,
    /// start the cooldown window.
    pub fn record_close(&mut self, strategy: &str, pnl: Decimal, ts: DateTime<Utc>) {
        let state = self.state_mut(strategy, ts);
        if pnl.is_sign_negative() {
            state.daily_loss += pnl.abs();
            state.last_loss_ts = Some(ts);
        } else {
            state.daily_wins += pnl;
        }
    }

    /// True if the strategy's net daily loss exceeds the configured limit.
    pub fn is_strategy_paused(&mut self, strategy: &str, now: DateTime<Utc>) -> bool {
        let state = self.state_mut(strategy, now);
        (state.daily_loss - state.daily_wins) > self.max_daily_loss_per_strategy
    }

    /// True if the strategy had a loss within the cooldown window.
    pub fn is_in_cooldown(&mut self, strategy: &str, now: DateTime<Utc>) -> bool {
        let state = self.state_mut(strategy, now);
        match state.last_loss_ts {
            Some(last) => now - last < self.cooldown_after_loss,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ts(mins: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            + Duration::minutes(mins)
    }

    #[test]
    fn pauses_after_exceeding_daily_loss() {
        let mut tracker = RiskTracker::new(dec!(100), 30);
        assert!(!tracker.is_strategy_paused("rsi", ts(0)));
        tracker.record_close("rsi", dec!(-150), ts(0));
        assert!(tracker.is_strategy_paused("rsi", ts(1)));
    }

    #[test]
    fn wins_offset_losses() {
        let mut tracker = RiskTracker::new(dec!(100), 30);
        tracker.record_close("rsi", dec!(-150), ts(0));
        tracker.record_close("rsi", dec!(80), ts(1));
        // net loss now 150 - 80 = 70, under the 100 limit
        assert!(!tracker.is_strategy_paused("rsi", ts(2)));
    }

    #[test]
    fn cooldown_expires_after_window() {
        let mut tracker = RiskTracker::new(dec!(100), 30);
        tracker.record_close("rsi", dec!(-10), ts(0));
        assert!(tracker.is_in_cooldown("rsi", ts(10)));
        assert!(!tracker.is_in_cooldown("rsi", ts(31)));
    }

    #[test]
    fn daily_state_resets_on_new_utc_day() {
        let mut tracker = RiskTracker::new(dec!(100), 30);
        tracker.record_close("rsi", dec!(-150), ts(0));
        assert!(tracker.is_strategy_paused("rsi", ts(60)));
        // jump a day forward
        let next_day = ts(0) + Duration::days(1);
        assert!(!tracker.is_strategy_paused("rsi", next_day));
    }

    #[test]
    fn wins_without_losses_never_pause() {
        let mut tracker = RiskTracker::new(dec!(100), 30);
        tracker.record_close("rsi", dec!(50), ts(0));
        assert!(!tracker.is_strategy_paused("rsi", ts(1)));
        assert!(!tracker.is_in_cooldown("rsi", ts(1)));
    }
}
