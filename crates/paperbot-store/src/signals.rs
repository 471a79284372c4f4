//! Signal persistence and atomic consumption.
//!
//! Grounded on `orchestrator/persistence.py::persist_signal` and
//! `paper/engine.py::consume_signals`.

use crate::error::StoreResult;
use chrono::{DateTime, Utc};
use paperbot_core::decimal::Price;
use paperbot_core::model::{Direction, Signal};
use serde_json::Value as Json;
use sqlx::PgPool;
use std::collections::HashMap;
use std::str::FromStr;

/// Append a new signal row with `acted_on = false`. Returns the
/// assigned id.
pub async fn persist_signal(pool: &PgPool, signal: &Signal) -> StoreResult<i64> {
    let metadata = Json::Object(signal.metadata.clone().into_iter().collect());
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO signals.signals
            (ts, strategy, asset, exchange, direction, confidence, entry_price, metadata, acted_on)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE)
        RETURNING id
        "#,
    )
    .bind(signal.ts)
    .bind(&signal.strategy)
    .bind(&signal.asset)
    .bind(&signal.exchange)
    .bind(signal.direction.to_string())
    .bind(signal.confidence)
    .bind(signal.entry_price.inner())
    .bind(metadata)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Atomically select every unconsumed signal for `(venue, strategy)`
/// ordered by timestamp, mark them `acted_on = true`, and return them.
/// The selection and the mark happen in a single transaction so the
/// same signal is never handed to two engines.
pub async fn consume_signals(
    pool: &PgPool,
    venue: &str,
    strategy: &str,
) -> StoreResult<Vec<Signal>> {
    let mut tx = pool.begin().await?;

    #[allow(clippy::type_complexity)]
    let rows: Vec<(i64, DateTime<Utc>, String, String, String, String, f64, rust_decimal::Decimal, Json)> =
        sqlx::query_as(
            r#"
            SELECT id, ts, strategy, asset, exchange, direction, confidence, entry_price, metadata
            FROM signals.signals
            WHERE acted_on = FALSE AND exchange = $1 AND strategy = $2
            ORDER BY ts ASC
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(venue)
        .bind(strategy)
        .fetch_all(&mut *tx)
        .await?;

    if !rows.is_empty() {
        let ids: Vec<i64> = rows.iter().map(|r| r.0).collect();
        sqlx::query("UPDATE signals.signals SET acted_on = TRUE WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    let signals = rows
        .into_iter()
        .map(
            |(id, ts, strategy, asset, exchange, direction, confidence, entry_price, metadata)| {
                let metadata: HashMap<String, Json> = match metadata {
                    Json::Object(map) => map.into_iter().collect(),
                    _ => HashMap::new(),
                };
                Signal {
                    id: Some(id),
                    ts,
                    strategy,
                    asset,
                    exchange,
                    direction: Direction::from_str(&direction)
                        .unwrap_or(Direction::Long),
                    confidence,
                    entry_price: Price::new(entry_price),
                    metadata,
                    acted_on: true,
                }
            },
        )
        .collect();

    Ok(signals)
}

/// Recent signals for a strategy, newest first. Used by the read API.
pub async fn recent_signals_for_strategy(
    pool: &PgPool,
    strategy: &str,
    limit: i64,
) -> StoreResult<Vec<Signal>> {
    #[allow(clippy::type_complexity)]
    let rows: Vec<(i64, DateTime<Utc>, String, String, String, String, f64, rust_decimal::Decimal, Json, bool)> =
        sqlx::query_as(
            r#"
            SELECT id, ts, strategy, asset, exchange, direction, confidence, entry_price, metadata, acted_on
            FROM signals.signals
            WHERE strategy = $1
            ORDER BY ts DESC
            LIMIT $2
            "#,
        )
        .bind(strategy)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, ts, strategy, asset, exchange, direction, confidence, entry_price, metadata, acted_on)| {
                let metadata: HashMap<String, Json> = match metadata {
                    Json::Object(map) => map.into_iter().collect(),
                    _ => HashMap::new(),
                };
                Signal {
                    id: Some(id),
                    ts,
                    strategy,
                    asset,
                    exchange,
                    direction: Direction::from_str(&direction).unwrap_or(Direction::Long),
                    confidence,
                    entry_price: Price::new(entry_price),
                    metadata,
                    acted_on,
                }
            },
        )
        .collect())
}
