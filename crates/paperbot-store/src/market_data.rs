//! Market data ingestion and the snapshot builder.
//!
//! Grounded on `original_source/.../collectors/hyperliquid.py` and
//! `collectors/polymarket.py` for the upsert-on-conflict pattern, and
//! `orchestrator/snapshot.py` for the snapshot query shapes.

use crate::error::StoreResult;
use chrono::{DateTime, Duration, Utc};
use paperbot_core::decimal::{Price, Size};
use paperbot_core::model::{Candle, FundingSnapshot, MarketSnapshot, PredictionMarketObservation};
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Insert a candle, doing nothing if one already exists for the
/// `(venue, asset, interval, open_time)` key (idempotent ingestion).
pub async fn insert_candle(pool: &PgPool, candle: &Candle) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO market_data.candles
            (venue, asset, interval, open_time, open, high, low, close, volume)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (venue, asset, interval, open_time) DO NOTHING
        "#,
    )
    .bind(&candle.venue)
    .bind(&candle.asset)
    .bind(&candle.interval)
    .bind(candle.open_time)
    .bind(candle.open.inner())
    .bind(candle.high.inner())
    .bind(candle.low.inner())
    .bind(candle.close.inner())
    .bind(candle.volume.inner())
    .execute(pool)
    .await?;
    Ok(())
}

/// Insert a funding snapshot, idempotent on `(venue, asset, ts)`.
pub async fn insert_funding_snapshot(pool: &PgPool, row: &FundingSnapshot) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO market_data.funding_snapshots
            (venue, asset, ts, funding_rate, open_interest, mark_price)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (venue, asset, ts) DO NOTHING
        "#,
    )
    .bind(&row.venue)
    .bind(&row.asset)
    .bind(row.ts)
    .bind(row.funding_rate)
    .bind(row.open_interest)
    .bind(row.mark_price.map(|p| p.inner()))
    .execute(pool)
    .await?;
    Ok(())
}

/// Insert a prediction-market observation, idempotent on `(market_id, ts)`.
pub async fn insert_prediction_market_observation(
    pool: &PgPool,
    row: &PredictionMarketObservation,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO market_data.prediction_market_observations
            (market_id, market_title, asset, ts, yes_price, no_price, volume_24h, liquidity, end_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (market_id, ts) DO NOTHING
        "#,
    )
    .bind(&row.market_id)
    .bind(&row.market_title)
    .bind(&row.asset)
    .bind(row.ts)
    .bind(row.yes_price)
    .bind(row.no_price)
    .bind(row.volume_24h)
    .bind(row.liquidity)
    .bind(row.end_date)
    .execute(pool)
    .await?;
    Ok(())
}

/// Most recent observation for `asset` with a non-null yes-price.
/// Used by the price oracle's polling-venue DB fallback.
pub async fn latest_prediction_market_price(
    pool: &PgPool,
    asset: &str,
) -> StoreResult<Option<Decimal>> {
    let row: Option<(Decimal,)> = sqlx::query_as(
        r#"
        SELECT yes_price FROM market_data.prediction_market_observations
        WHERE asset = $1 AND yes_price IS NOT NULL
        ORDER BY ts DESC
        LIMIT 1
        "#,
    )
    .bind(asset)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(p,)| p))
}

/// Most recent candle close for `(venue, asset)`. Used as the oracle's
/// secondary DB fallback for the streaming venue (mirrors
/// `paper/pricing.py::get_latest_price`).
pub async fn latest_candle_close(
    pool: &PgPool,
    venue: &str,
    asset: &str,
) -> StoreResult<Option<Decimal>> {
    let row: Option<(Decimal,)> = sqlx::query_as(
        r#"
        SELECT close FROM market_data.candles
        WHERE venue = $1 AND asset = $2
        ORDER BY open_time DESC
        LIMIT 1
        "#,
    )
    .bind(venue)
    .bind(asset)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(p,)| p))
}

/// Parameters controlling how much history the snapshot builder pulls.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotWindow {
    pub candle_limit: i64,
    pub funding_days: i64,
    pub polymarket_limit: i64,
}

impl Default for SnapshotWindow {
    fn default() -> Self {
        Self {
            candle_limit: 100,
            funding_days: 7,
            polymarket_limit: 10,
        }
    }
}

/// Assemble a [`MarketSnapshot`] for `asset`: recent candles, recent
/// funding rows, recent prediction-market rows, all ordered
/// oldest-first. Grounded on `orchestrator/snapshot.py::build_snapshot`.
pub async fn build_snapshot(
    pool: &PgPool,
    asset: &str,
    window: SnapshotWindow,
) -> StoreResult<MarketSnapshot> {
    let candle_rows: Vec<(String, String, String, DateTime<Utc>, Decimal, Decimal, Decimal, Decimal, Decimal)> =
        sqlx::query_as(
            r#"
            SELECT venue, asset, interval, open_time, open, high, low, close, volume
            FROM market_data.candles
            WHERE asset = $1
            ORDER BY open_time DESC
            LIMIT $2
            "#,
        )
        .bind(asset)
        .bind(window.candle_limit)
        .fetch_all(pool)
        .await?;

    let mut candles: Vec<Candle> = candle_rows
        .into_iter()
        .map(
            |(venue, asset, interval, open_time, open, high, low, close, volume)| Candle {
                venue,
                asset,
                interval,
                open_time,
                open: Price::new(open),
                high: Price::new(high),
                low: Price::new(low),
                close: Price::new(close),
                volume: Size::new(volume),
            },
        )
        .collect();
    candles.reverse(); // oldest-first

    let funding_cutoff = Utc::now() - Duration::days(window.funding_days);
    let funding_rows: Vec<(String, String, DateTime<Utc>, Decimal, Option<Decimal>, Option<Decimal>)> =
        sqlx::query_as(
            r#"
            SELECT venue, asset, ts, funding_rate, open_interest, mark_price
            FROM market_data.funding_snapshots
            WHERE asset = $1 AND ts >= $2
            ORDER BY ts ASC
            "#,
        )
        .bind(asset)
        .bind(funding_cutoff)
        .fetch_all(pool)
        .await?;

    let funding: Vec<FundingSnapshot> = funding_rows
        .into_iter()
        .map(
            |(venue, asset, ts, funding_rate, open_interest, mark_price)| FundingSnapshot {
                venue,
                asset,
                ts,
                funding_rate,
                open_interest,
                mark_price: mark_price.map(Price::new),
            },
        )
        .collect();

    #[allow(clippy::type_complexity)]
    let polymarket_rows: Vec<(
        String,
        String,
        String,
        DateTime<Utc>,
        Option<Decimal>,
        Option<Decimal>,
        Option<Decimal>,
        Option<Decimal>,
        Option<DateTime<Utc>>,
    )> = sqlx::query_as(
        r#"
        SELECT market_id, market_title, asset, ts, yes_price, no_price, volume_24h, liquidity, end_date
        FROM market_data.prediction_market_observations
        WHERE asset = $1
        ORDER BY ts DESC
        LIMIT $2
        "#,
    )
    .bind(asset)
    .bind(window.polymarket_limit)
    .fetch_all(pool)
    .await?;

    let mut polymarket: Vec<PredictionMarketObservation> = polymarket_rows
        .into_iter()
        .map(
            |(market_id, market_title, asset, ts, yes_price, no_price, volume_24h, liquidity, end_date)| {
                PredictionMarketObservation {
                    market_id,
                    market_title,
                    asset,
                    ts,
                    yes_price,
                    no_price,
                    volume_24h,
                    liquidity,
                    end_date,
                }
            },
        )
        .collect();
    polymarket.reverse(); // oldest-first

    Ok(MarketSnapshot {
        asset: asset.to_string(),
        ts: Utc::now(),
        candles,
        funding,
        polymarket,
    })
}
