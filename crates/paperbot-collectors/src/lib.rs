//! Market-data collectors: Hyperliquid candles/funding and Polymarket
//! prediction markets, both landed into [`paperbot_store::market_data`].

pub mod error;
pub mod hyperliquid;
pub mod polymarket;

pub use error::{CollectorError, CollectorResult};
pub use hyperliquid::{backfill_candles, candle_listener, funding_poller, HyperliquidClient};
pub use polymarket::{classify_asset, poll_markets, PolymarketClient};
