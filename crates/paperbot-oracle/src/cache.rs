//! Dual-venue price cache.
//!
//! Grounded on `original_source/.../paper/oracle.py::PriceOracle`. Two
//! independent caches, one per venue, each with its own staleness
//! threshold: the streaming Hyperliquid mid (fast, 30s) and the
//! polling Polymarket yes-price (slow, 600s, with a database
//! fallback when the in-memory cache itself is stale).

use dashmap::DashMap;
use rust_decimal::Decimal;
use std::time::{Duration, Instant};

/// Where a cached price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Ws,
    Db,
    Manual,
}

#[derive(Debug, Clone)]
struct PriceEntry {
    price: Decimal,
    updated_at: Instant,
    #[allow(dead_code)]
    source: PriceSource,
}

/// One venue's price cache: asset symbol to last-known price, keyed
/// by a monotonic update time so staleness survives wall-clock jumps.
pub struct VenueCache {
    staleness: Duration,
    prices: DashMap<String, PriceEntry>,
}

impl VenueCache {
    pub fn new(staleness: Duration) -> Self {
        Self {
            staleness,
            prices: DashMap::new(),
        }
    }

    pub fn update(&self, asset: &str, price: Decimal, source: PriceSource) {
        self.prices.insert(
            asset.to_string(),
            PriceEntry {
                price,
                updated_at: Instant::now(),
                source,
            },
        );
    }

    /// The cached price if present and fresher than the staleness
    /// threshold, else `None`.
    pub fn get_fresh(&self, asset: &str) -> Option<Decimal> {
        self.prices.get(asset).and_then(|entry| {
            if entry.updated_at.elapsed() <= self.staleness {
                Some(entry.price)
            } else {
                None
            }
        })
    }

    pub fn is_stale(&self, asset: &str) -> bool {
        self.get_fresh(asset).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn fresh_price_is_returned() {
        let cache = VenueCache::new(Duration::from_secs(30));
        cache.update("BTC", dec!(60000), PriceSource::Ws);
        assert_eq!(cache.get_fresh("BTC"), Some(dec!(60000)));
        assert!(!cache.is_stale("BTC"));
    }

    #[test]
    fn missing_asset_is_stale() {
        let cache = VenueCache::new(Duration::from_secs(30));
        assert!(cache.is_stale("ETH"));
        assert_eq!(cache.get_fresh("ETH"), None);
    }

    #[test]
    fn zero_threshold_is_always_stale() {
        let cache = VenueCache::new(Duration::from_secs(0));
        cache.update("SOL", dec!(150), PriceSource::Manual);
        assert!(cache.is_stale("SOL"));
    }
}
