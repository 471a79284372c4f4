//! Position sizing, slippage, fee, and P&L calculations. Pure
//! functions, no store or oracle dependency.
//!
//! Grounded on `original_source/.../paper/sizing.py`.

use crate::config::PaperConfig;
use paperbot_core::model::Direction;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Fixed-fractional position size: risk a fixed percentage of equity
/// against the stop-loss distance.
pub fn calculate_position_size(
    entry_price: Decimal,
    equity: Decimal,
    risk_pct: Decimal,
    stop_loss_pct: Decimal,
) -> Decimal {
    let stop_distance = entry_price * stop_loss_pct;
    if stop_distance.is_zero() {
        return Decimal::ZERO;
    }
    let risk_amount = equity * risk_pct;
    risk_amount / stop_distance
}

/// Realised P&L for a closed round trip.
pub fn calculate_pnl(direction: Direction, entry_price: Decimal, exit_price: Decimal, quantity: Decimal) -> Decimal {
    direction.sign() * (exit_price - entry_price) * quantity
}

pub fn calculate_stop_price(direction: Direction, entry_price: Decimal, stop_loss_pct: Decimal) -> Decimal {
    match direction {
        Direction::Long => entry_price * (Decimal::ONE - stop_loss_pct),
        Direction::Short => entry_price * (Decimal::ONE + stop_loss_pct),
    }
}

pub fn calculate_take_profit_price(direction: Direction, entry_price: Decimal, take_profit_pct: Decimal) -> Decimal {
    match direction {
        Direction::Long => entry_price * (Decimal::ONE + take_profit_pct),
        Direction::Short => entry_price * (Decimal::ONE - take_profit_pct),
    }
}

/// Kelly fraction from a win probability and the stop/take-profit
/// reward-to-risk ratio. Half-Kelly (or whatever `safety_factor` is
/// configured to) by default. Returns 0.0 when there is no edge.
pub fn calculate_kelly_fraction(
    win_prob: f64,
    stop_loss_pct: f64,
    take_profit_pct: f64,
    safety_factor: f64,
) -> f64 {
    if stop_loss_pct == 0.0 {
        return 0.0;
    }
    let b = take_profit_pct / stop_loss_pct;
    if b == 0.0 {
        return 0.0;
    }
    let kelly = (win_prob * b - (1.0 - win_prob)) / b;
    if kelly <= 0.0 {
        return 0.0;
    }
    kelly * safety_factor
}

/// Maps signal confidence (0-1) to a win probability for Kelly:
/// confidence=0 -> base_rate, confidence=1 -> certainty.
pub fn confidence_to_win_prob(confidence: f64, base_rate: f64) -> f64 {
    base_rate + confidence * (1.0 - base_rate)
}

/// Kelly allocation fraction of equity, or 0.0 if Kelly is disabled,
/// there is no confidence to size from, or there is no edge.
pub fn calculate_kelly_allocation(confidence: Option<f64>, config: &PaperConfig) -> f64 {
    let Some(confidence) = confidence else {
        return 0.0;
    };
    if !config.kelly_enabled {
        return 0.0;
    }
    let win_prob = confidence_to_win_prob(confidence, config.kelly_base_win_prob);
    calculate_kelly_fraction(
        win_prob,
        config.default_stop_loss_pct.to_f64().unwrap_or(0.0),
        config.default_take_profit_pct.to_f64().unwrap_or(0.0),
        config.kelly_safety_factor,
    )
}

/// Kelly-sized position quantity, capped by the fixed-fractional risk
/// budget so an overconfident signal can never exceed it.
pub fn calculate_position_size_kelly(
    entry_price: Decimal,
    equity: Decimal,
    kelly_allocation: f64,
    risk_pct: Decimal,
    stop_loss_pct: Decimal,
) -> Decimal {
    if entry_price.is_zero() || kelly_allocation <= 0.0 || stop_loss_pct.is_zero() {
        return Decimal::ZERO;
    }
    let kelly_dec = Decimal::try_from(kelly_allocation).unwrap_or(Decimal::ZERO);
    let notional = equity * kelly_dec;
    let max_notional = (equity * risk_pct) / stop_loss_pct;
    notional.min(max_notional) / entry_price
}

/// Apply slippage to a price. Entries pay the spread; exits receive
/// the worse side of it.
pub fn apply_slippage(price: Decimal, direction: Direction, slippage_pct: Decimal, is_entry: bool) -> Decimal {
    let long_pays_more = matches!(direction, Direction::Long) == is_entry;
    if long_pays_more {
        price * (Decimal::ONE + slippage_pct)
    } else {
        price * (Decimal::ONE - slippage_pct)
    }
}

/// Round-trip fees, charged on notional at both entry and exit.
pub fn calculate_fees(entry_price: Decimal, exit_price: Decimal, quantity: Decimal, fee_pct: Decimal) -> Decimal {
    let entry_notional = entry_price * quantity;
    let exit_notional = exit_price * quantity;
    (entry_notional + exit_notional) * fee_pct
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fixed_fractional_sizing() {
        // risk 2% of 10000 = 200; stop distance = 60000*0.02 = 1200; qty = 200/1200
        let qty = calculate_position_size(dec!(60000), dec!(10000), dec!(0.02), dec!(0.02));
        assert_eq!(qty, dec!(0.1666666666666666666666666667));
    }

    #[test]
    fn zero_stop_distance_yields_zero_size() {
        assert_eq!(calculate_position_size(dec!(60000), dec!(10000), dec!(0.02), dec!(0)), Decimal::ZERO);
    }

    #[test]
    fn pnl_long_vs_short() {
        assert_eq!(calculate_pnl(Direction::Long, dec!(100), dec!(110), dec!(2)), dec!(20));
        assert_eq!(calculate_pnl(Direction::Short, dec!(100), dec!(110), dec!(2)), dec!(-20));
    }

    #[test]
    fn stop_and_take_profit_prices() {
        assert_eq!(calculate_stop_price(Direction::Long, dec!(100), dec!(0.02)), dec!(98));
        assert_eq!(calculate_stop_price(Direction::Short, dec!(100), dec!(0.02)), dec!(102));
        assert_eq!(calculate_take_profit_price(Direction::Long, dec!(100), dec!(0.04)), dec!(104));
        assert_eq!(calculate_take_profit_price(Direction::Short, dec!(100), dec!(0.04)), dec!(96));
    }

    #[test]
    fn kelly_fraction_requires_positive_edge() {
        // b = 2 (tp 4% / sl 2%), win_prob 0.5 -> kelly = (0.5*2 - 0.5)/2 = 0.25, half-kelly = 0.125
        assert!((calculate_kelly_fraction(0.5, 0.02, 0.04, 0.5) - 0.125).abs() < 1e-9);
        // a coin-flip at 1:1 reward-to-risk has no edge
        assert_eq!(calculate_kelly_fraction(0.5, 0.02, 0.02, 0.5), 0.0);
    }

    #[test]
    fn confidence_maps_to_win_probability() {
        assert_eq!(confidence_to_win_prob(0.0, 0.5), 0.5);
        assert_eq!(confidence_to_win_prob(1.0, 0.5), 1.0);
    }

    #[test]
    fn kelly_position_size_is_capped_by_risk_budget() {
        let size = calculate_position_size_kelly(dec!(100), dec!(10000), 0.9, dec!(0.02), dec!(0.02));
        // max_notional = (10000*0.02)/0.02 = 10000; kelly notional = 9000; capped notional = 9000
        assert_eq!(size, dec!(90));
    }

    #[test]
    fn slippage_entry_vs_exit() {
        assert_eq!(apply_slippage(dec!(100), Direction::Long, dec!(0.001), true), dec!(100.1));
        assert_eq!(apply_slippage(dec!(100), Direction::Short, dec!(0.001), true), dec!(99.9));
        assert_eq!(apply_slippage(dec!(100), Direction::Long, dec!(0.001), false), dec!(99.9));
        assert_eq!(apply_slippage(dec!(100), Direction::Short, dec!(0.001), false), dec!(100.1));
    }

    #[test]
    fn fees_charged_on_both_legs() {
        let fees = calculate_fees(dec!(100), dec!(110), dec!(2), dec!(0.001));
        // (200 + 220) * 0.001 = 0.42
        assert_eq!(fees, dec!(0.420));
    }
}
