//! Mark-to-market persistence and equity-curve / portfolio aggregation
//! reads.
//!
//! Grounded on `paper/engine.py::write_mark_to_market` and
//! `orchestrator/aggregate.py::portfolio_equity_curve`.

use crate::error::StoreResult;
use chrono::{DateTime, Utc};
use paperbot_core::model::AccountMarkToMarket;
use rust_decimal::Decimal;
use serde_json::Value as Json;
use sqlx::PgPool;
use std::collections::HashMap;

/// Append one mark-to-market row for `account_id`.
pub async fn insert(pool: &PgPool, row: &AccountMarkToMarket) -> StoreResult<()> {
    let breakdown = Json::Object(row.breakdown.clone().into_iter().collect());
    sqlx::query(
        r#"
        INSERT INTO accounts.account_mark_to_market
            (account_id, ts, total_equity, unrealised_pnl, realised_pnl, open_positions, breakdown)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(row.account_id)
    .bind(row.ts)
    .bind(row.total_equity)
    .bind(row.unrealised_pnl)
    .bind(row.realised_pnl)
    .bind(row.open_positions)
    .bind(breakdown)
    .execute(pool)
    .await?;
    Ok(())
}

/// Mark-to-market history for a single account, oldest first. Backs
/// the read API's equity-curve endpoint.
pub async fn equity_curve(pool: &PgPool, account_id: i64, limit: i64) -> StoreResult<Vec<AccountMarkToMarket>> {
    let rows: Vec<(i64, DateTime<Utc>, Decimal, Decimal, Decimal, i64, Json)> = sqlx::query_as(
        r#"
        SELECT account_id, ts, total_equity, unrealised_pnl, realised_pnl, open_positions, breakdown
        FROM accounts.account_mark_to_market
        WHERE account_id = $1
        ORDER BY ts DESC
        LIMIT $2
        "#,
    )
    .bind(account_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut curve: Vec<AccountMarkToMarket> = rows
        .into_iter()
        .map(
            |(account_id, ts, total_equity, unrealised_pnl, realised_pnl, open_positions, breakdown)| {
                let breakdown: HashMap<String, Json> = match breakdown {
                    Json::Object(map) => map.into_iter().collect(),
                    _ => HashMap::new(),
                };
                AccountMarkToMarket {
                    account_id,
                    ts,
                    total_equity,
                    unrealised_pnl,
                    realised_pnl,
                    open_positions,
                    breakdown,
                }
            },
        )
        .collect();
    curve.reverse();
    Ok(curve)
}

/// Most recent mark-to-market row for `account_id`, if any.
pub async fn latest(pool: &PgPool, account_id: i64) -> StoreResult<Option<AccountMarkToMarket>> {
    let row: Option<(i64, DateTime<Utc>, Decimal, Decimal, Decimal, i64, Json)> = sqlx::query_as(
        r#"
        SELECT account_id, ts, total_equity, unrealised_pnl, realised_pnl, open_positions, breakdown
        FROM accounts.account_mark_to_market
        WHERE account_id = $1
        ORDER BY ts DESC
        LIMIT 1
        "#,
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(account_id, ts, total_equity, unrealised_pnl, realised_pnl, open_positions, breakdown)| {
            let breakdown: HashMap<String, Json> = match breakdown {
                Json::Object(map) => map.into_iter().collect(),
                _ => HashMap::new(),
            };
            AccountMarkToMarket {
                account_id,
                ts,
                total_equity,
                unrealised_pnl,
                realised_pnl,
                open_positions,
                breakdown,
            }
        },
    ))
}

/// Sum of the latest mark-to-market row for each member account of a
/// portfolio group, as of `as_of`. Used to compute aggregated
/// portfolio equity without double-counting a member whose latest row
/// predates `as_of`.
pub async fn portfolio_equity_as_of(
    pool: &PgPool,
    account_ids: &[i64],
    as_of: DateTime<Utc>,
) -> StoreResult<Decimal> {
    if account_ids.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let rows: Vec<(Decimal,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT ON (account_id) total_equity
        FROM accounts.account_mark_to_market
        WHERE account_id = ANY($1) AND ts <= $2
        ORDER BY account_id, ts DESC
        "#,
    )
    .bind(account_ids)
    .bind(as_of)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(equity,)| equity).sum())
}
