//! Position persistence: open, list, and close.
//!
//! Grounded on `paper/engine.py::open_position` / `close_position` and
//! `paper/engine.py::check_exits` for the close-path fields.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use paperbot_core::decimal::{Price, Size};
use paperbot_core::model::{Direction, ExitReason, Position, PositionStatus};
use rust_decimal::Decimal;
use serde_json::Value as Json;
use sqlx::PgPool;
use std::collections::HashMap;
use std::str::FromStr;

#[allow(clippy::type_complexity)]
fn row_to_position(
    id: i64,
    account_id: i64,
    strategy: String,
    asset: String,
    venue: String,
    direction: String,
    entry_price: Decimal,
    entry_ts: DateTime<Utc>,
    quantity: Decimal,
    exit_price: Option<Decimal>,
    exit_ts: Option<DateTime<Utc>>,
    exit_reason: Option<String>,
    realised_pnl: Option<Decimal>,
    status: String,
    signal_id: Option<i64>,
    metadata: Json,
) -> Position {
    let metadata: HashMap<String, Json> = match metadata {
        Json::Object(map) => map.into_iter().collect(),
        _ => HashMap::new(),
    };
    Position {
        id: Some(id),
        account_id,
        strategy,
        asset,
        venue,
        direction: Direction::from_str(&direction).unwrap_or(Direction::Long),
        entry_price: Price::new(entry_price),
        entry_ts,
        quantity: Size::new(quantity),
        exit_price: exit_price.map(Price::new),
        exit_ts,
        exit_reason: exit_reason.and_then(|r| match r.as_str() {
            "signal" => Some(ExitReason::Signal),
            "stop_loss" => Some(ExitReason::StopLoss),
            "take_profit" => Some(ExitReason::TakeProfit),
            "timeout" => Some(ExitReason::Timeout),
            _ => None,
        }),
        realised_pnl,
        status: if status == "OPEN" {
            PositionStatus::Open
        } else {
            PositionStatus::Closed
        },
        signal_id,
        metadata,
    }
}

/// Insert a new open position and return its assigned id.
pub async fn open_position(pool: &PgPool, position: &Position) -> StoreResult<i64> {
    let metadata = Json::Object(position.metadata.clone().into_iter().collect());
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO accounts.account_positions
            (account_id, strategy, asset, exchange, direction, entry_price, entry_ts,
             quantity, status, signal_id, metadata)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'OPEN', $9, $10)
        RETURNING id
        "#,
    )
    .bind(position.account_id)
    .bind(&position.strategy)
    .bind(&position.asset)
    .bind(&position.venue)
    .bind(position.direction.to_string())
    .bind(position.entry_price.inner())
    .bind(position.entry_ts)
    .bind(position.quantity.inner())
    .bind(position.signal_id)
    .bind(metadata)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Every open position for `account_id`.
pub async fn list_open(pool: &PgPool, account_id: i64) -> StoreResult<Vec<Position>> {
    #[allow(clippy::type_complexity)]
    let rows: Vec<(
        i64, i64, String, String, String, String, Decimal, DateTime<Utc>, Decimal,
        Option<Decimal>, Option<DateTime<Utc>>, Option<String>, Option<Decimal>, String,
        Option<i64>, Json,
    )> = sqlx::query_as(
        r#"
        SELECT id, account_id, strategy, asset, exchange, direction, entry_price, entry_ts,
               quantity, exit_price, exit_ts, exit_reason, realised_pnl, status, signal_id, metadata
        FROM accounts.account_positions
        WHERE account_id = $1 AND status = 'OPEN'
        ORDER BY entry_ts ASC
        "#,
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(
                id, account_id, strategy, asset, venue, direction, entry_price, entry_ts, quantity,
                exit_price, exit_ts, exit_reason, realised_pnl, status, signal_id, metadata,
            )| {
                row_to_position(
                    id, account_id, strategy, asset, venue, direction, entry_price, entry_ts,
                    quantity, exit_price, exit_ts, exit_reason, realised_pnl, status, signal_id,
                    metadata,
                )
            },
        )
        .collect())
}

/// Mark a position closed, setting its exit fields. Fails silently
/// (affects zero rows) if the position was already closed by a
/// concurrent writer, since exactly one close should ever win.
pub async fn close_position(
    pool: &PgPool,
    position_id: i64,
    exit_price: Price,
    exit_ts: DateTime<Utc>,
    exit_reason: ExitReason,
    realised_pnl: Decimal,
    metadata_patch: Json,
) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE accounts.account_positions
        SET exit_price = $1, exit_ts = $2, exit_reason = $3, realised_pnl = $4, status = 'CLOSED',
            metadata = metadata || $5
        WHERE id = $6 AND status = 'OPEN'
        "#,
    )
    .bind(exit_price.inner())
    .bind(exit_ts)
    .bind(exit_reason.to_string())
    .bind(realised_pnl)
    .bind(metadata_patch)
    .bind(position_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::PositionNotFound(position_id));
    }
    Ok(())
}

/// Closed positions across every account for `strategy`, newest exit
/// first. Used by the read API's strategy trade-history endpoint.
pub async fn list_closed_by_strategy(pool: &PgPool, strategy: &str, limit: i64) -> StoreResult<Vec<Position>> {
    #[allow(clippy::type_complexity)]
    let rows: Vec<(
        i64, i64, String, String, String, String, Decimal, DateTime<Utc>, Decimal,
        Option<Decimal>, Option<DateTime<Utc>>, Option<String>, Option<Decimal>, String,
        Option<i64>, Json,
    )> = sqlx::query_as(
        r#"
        SELECT id, account_id, strategy, asset, exchange, direction, entry_price, entry_ts,
               quantity, exit_price, exit_ts, exit_reason, realised_pnl, status, signal_id, metadata
        FROM accounts.account_positions
        WHERE strategy = $1 AND status = 'CLOSED'
        ORDER BY exit_ts DESC
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
            |(
                id, account_id, strategy, asset, venue, direction, entry_price, entry_ts, quantity,
                exit_price, exit_ts, exit_reason, realised_pnl, status, signal_id, metadata,
            )| {
                row_to_position(
                    id, account_id, strategy, asset, venue, direction, entry_price, entry_ts,
                    quantity, exit_price, exit_ts, exit_reason, realised_pnl, status, signal_id,
                    metadata,
                )
            },
        )
        .collect())
}

/// Closed positions across every account and strategy for `asset`.
/// Used by the read API's per-asset performance endpoint, which
/// groups the result by strategy itself.
pub async fn list_closed_by_asset(pool: &PgPool, asset: &str) -> StoreResult<Vec<Position>> {
    #[allow(clippy::type_complexity)]
    let rows: Vec<(
        i64, i64, String, String, String, String, Decimal, DateTime<Utc>, Decimal,
        Option<Decimal>, Option<DateTime<Utc>>, Option<String>, Option<Decimal>, String,
        Option<i64>, Json,
    )> = sqlx::query_as(
        r#"
        SELECT id, account_id, strategy, asset, exchange, direction, entry_price, entry_ts,
               quantity, exit_price, exit_ts, exit_reason, realised_pnl, status, signal_id, metadata
        FROM accounts.account_positions
        WHERE asset = $1 AND status = 'CLOSED'
        ORDER BY exit_ts DESC
        "#,
    )
    .bind(asset)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(
                id, account_id, strategy, asset, venue, direction, entry_price, entry_ts, quantity,
                exit_price, exit_ts, exit_reason, realised_pnl, status, signal_id, metadata,
            )| {
                row_to_position(
                    id, account_id, strategy, asset, venue, direction, entry_price, entry_ts,
                    quantity, exit_price, exit_ts, exit_reason, realised_pnl, status, signal_id,
                    metadata,
                )
            },
        )
        .collect())
}

/// Closed positions for `account_id`, newest exit first. Used by the
/// read API's trade-history endpoint.
pub async fn list_closed(pool: &PgPool, account_id: i64, limit: i64) -> StoreResult<Vec<Position>> {
    #[allow(clippy::type_complexity)]
    let rows: Vec<(
        i64, i64, String, String, String, String, Decimal, DateTime<Utc>, Decimal,
        Option<Decimal>, Option<DateTime<Utc>>, Option<String>, Option<Decimal>, String,
        Option<i64>, Json,
    )> = sqlx::query_as(
        r#"
        SELECT id, account_id, strategy, asset, exchange, direction, entry_price, entry_ts,
               quantity, exit_price, exit_ts, exit_reason, realised_pnl, status, signal_id, metadata
        FROM accounts.account_positions
        WHERE account_id = $1 AND status = 'CLOSED'
        ORDER BY exit_ts DESC
        LIMIT $2
        "#,
    )
    .bind(account_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(
                id, account_id, strategy, asset, venue, direction, entry_price, entry_ts, quantity,
                exit_price, exit_ts, exit_reason, realised_pnl, status, signal_id, metadata,
            )| {
                row_to_position(
                    id, account_id, strategy, asset, venue, direction, entry_price, entry_ts,
                    quantity, exit_price, exit_ts, exit_reason, realised_pnl, status, signal_id,
                    metadata,
                )
            },
        )
        .collect())
}
