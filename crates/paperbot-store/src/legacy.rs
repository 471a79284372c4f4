//! Legacy single-portfolio schema (`paper.*`).
//!
//! Retained for backward compatibility with the original single-
//! portfolio deployment mode; the engine itself is driven entirely
//! through [`crate::accounts`] and [`crate::positions`] against the
//! `accounts.*` schema. Not exercised by the orchestrator, kept so an
//! existing `paper.*` database does not lose history on upgrade.

use crate::error::StoreResult;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Ensure the single default portfolio row exists and return its id.
pub async fn ensure_portfolio(pool: &PgPool, name: &str, initial_capital: Decimal) -> StoreResult<i64> {
    sqlx::query(
        r#"
        INSERT INTO paper.portfolios (name, initial_capital)
        VALUES ($1, $2)
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(initial_capital)
    .execute(pool)
    .await?;

    let (id,): (i64,) = sqlx::query_as("SELECT id FROM paper.portfolios WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

/// Most recent total equity recorded for the legacy portfolio, if any.
pub async fn latest_equity(pool: &PgPool, portfolio_id: i64) -> StoreResult<Option<Decimal>> {
    let row: Option<(Decimal,)> = sqlx::query_as(
        r#"
        SELECT total_equity FROM paper.mark_to_market
        WHERE portfolio_id = $1
        ORDER BY ts DESC
        LIMIT 1
        "#,
    )
    .bind(portfolio_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(e,)| e))
}

/// Append a legacy mark-to-market row.
pub async fn insert_mark_to_market(
    pool: &PgPool,
    portfolio_id: i64,
    ts: DateTime<Utc>,
    total_equity: Decimal,
    unrealised_pnl: Decimal,
    realised_pnl: Decimal,
    open_positions: i64,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO paper.mark_to_market
            (portfolio_id, ts, total_equity, unrealised_pnl, realised_pnl, open_positions)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(portfolio_id)
    .bind(ts)
    .bind(total_equity)
    .bind(unrealised_pnl)
    .bind(realised_pnl)
    .bind(open_positions)
    .execute(pool)
    .await?;
    Ok(())
}
