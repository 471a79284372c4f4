//! Technical indicators: pure functions over decimal price series.
//!
//! Not pulled from an external crate — no indicator library is part
//! of this workspace's dependency stack, so these are ported directly
//! from the reference formulas.

use paperbot_core::decimal::Price;
use rust_decimal::Decimal;

/// Relative Strength Index with Wilder's smoothing. Returns `None` if
/// fewer than `period + 1` closes are available.
pub fn rsi(closes: &[Price], period: usize) -> Option<Decimal> {
    if closes.len() < period + 1 {
        return None;
    }

    let deltas: Vec<Decimal> = closes
        .windows(2)
        .map(|w| w[1].inner() - w[0].inner())
        .collect();

    let period_dec = Decimal::from(period as u64);
    let seed_gains: Decimal = deltas[..period].iter().map(|d| d.max(Decimal::ZERO)).sum();
    let seed_losses: Decimal = deltas[..period].iter().map(|d| (-*d).max(Decimal::ZERO)).sum();
    let mut avg_gain = seed_gains / period_dec;
    let mut avg_loss = seed_losses / period_dec;

    for d in &deltas[period..] {
        let gain = d.max(Decimal::ZERO);
        let loss = (-*d).max(Decimal::ZERO);
        avg_gain = (avg_gain * (period_dec - Decimal::ONE) + gain) / period_dec;
        avg_loss = (avg_loss * (period_dec - Decimal::ONE) + loss) / period_dec;
    }

    if avg_loss.is_zero() {
        return Some(Decimal::from(100));
    }
    let rs = avg_gain / avg_loss;
    Some(Decimal::from(100) - Decimal::from(100) / (Decimal::ONE + rs))
}

/// Bollinger Bands: `(lower, middle, upper)` as SMA +/- `num_std`
/// standard deviations over the trailing `period` closes. `None` if
/// fewer than `period` closes are available.
pub fn bollinger_bands(closes: &[Price], period: usize, num_std: Decimal) -> Option<(Decimal, Decimal, Decimal)> {
    if closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let period_dec = Decimal::from(period as u64);
    let middle: Decimal = window.iter().map(|p| p.inner()).sum::<Decimal>() / period_dec;
    let variance: Decimal = window
        .iter()
        .map(|p| (p.inner() - middle) * (p.inner() - middle))
        .sum::<Decimal>()
        / period_dec;
    let std = variance.sqrt().unwrap_or(Decimal::ZERO);
    let offset = std * num_std;
    Some((middle - offset, middle, middle + offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn prices(vals: &[i64]) -> Vec<Price> {
        vals.iter().map(|v| Price::new(Decimal::from(*v))).collect()
    }

    #[test]
    fn rsi_none_with_insufficient_data() {
        assert!(rsi(&prices(&[1, 2, 3]), 14).is_none());
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let series: Vec<Price> = (1..=20).map(|v| Price::new(Decimal::from(v))).collect();
        let value = rsi(&series, 14).unwrap();
        assert_eq!(value, dec!(100));
    }

    #[test]
    fn rsi_mixed_series_within_bounds() {
        let series = prices(&[
            100, 102, 101, 105, 103, 107, 106, 110, 108, 112, 111, 115, 113, 117, 120,
        ]);
        let value = rsi(&series, 14).unwrap();
        assert!(value > Decimal::ZERO && value <= dec!(100));
    }

    #[test]
    fn bollinger_none_with_insufficient_data() {
        assert!(bollinger_bands(&prices(&[1, 2, 3]), 20, dec!(2)).is_none());
    }

    #[test]
    fn bollinger_flat_series_has_zero_width() {
        let series = vec![Price::new(dec!(100)); 20];
        let (lower, middle, upper) = bollinger_bands(&series, 20, dec!(2)).unwrap();
        assert_eq!(lower, dec!(100));
        assert_eq!(middle, dec!(100));
        assert_eq!(upper, dec!(100));
    }
}
