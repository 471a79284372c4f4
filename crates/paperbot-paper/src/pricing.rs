//! Price lookup: consult the oracle first, fall back to the store's
//! latest candle close.
//!
//! Grounded on `original_source/.../paper/engine.py::PaperEngine._get_price`
//! and `paper/pricing.py::get_latest_price`.

use crate::error::PaperResult;
use paperbot_oracle::PriceOracle;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;

pub async fn get_price(
    oracle: Option<&Arc<PriceOracle>>,
    pool: &PgPool,
    asset: &str,
    venue: &str,
) -> PaperResult<Option<Decimal>> {
    if let Some(oracle) = oracle {
        if let Some(price) = oracle.get_price(asset, venue).await? {
            return Ok(Some(price));
        }
    }
    Ok(paperbot_store::market_data::latest_candle_close(pool, venue, asset).await?)
}
