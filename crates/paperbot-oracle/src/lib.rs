//! Dual-venue price oracle: an in-process cache fed by a Hyperliquid
//! `allMids` WebSocket stream plus a Polymarket database fallback.

pub mod cache;
pub mod error;
pub mod oracle;

pub use cache::{PriceSource, VenueCache};
pub use error::{OracleError, OracleResult};
pub use oracle::{PriceOracle, HYPERLIQUID, POLYMARKET};
