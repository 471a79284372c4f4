//! Account and portfolio-group persistence.
//!
//! Grounded on `orchestrator/bootstrap.py::ensure_accounts` (one
//! account per enabled `(strategy, venue)` pair).

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use paperbot_core::model::{Account, PortfolioGroup};
use rust_decimal::Decimal;
use serde_json::Value as Json;
use sqlx::PgPool;
use std::collections::HashMap;

/// Create the account for `(name, venue, strategy)` if it does not
/// already exist, otherwise leave the existing row untouched. Returns
/// the account's id either way. Grounded on the original's
/// `INSERT ... ON CONFLICT DO NOTHING` + re-select bootstrap idiom.
pub async fn ensure_account(
    pool: &PgPool,
    name: &str,
    venue: &str,
    strategy: &str,
    initial_capital: Decimal,
) -> StoreResult<i64> {
    sqlx::query(
        r#"
        INSERT INTO accounts.accounts (name, venue, strategy, initial_capital, active, metadata)
        VALUES ($1, $2, $3, $4, TRUE, '{}')
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(venue)
    .bind(strategy)
    .bind(initial_capital)
    .execute(pool)
    .await?;

    let (id,): (i64,) = sqlx::query_as("SELECT id FROM accounts.accounts WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

fn row_to_account(
    id: i64,
    name: String,
    venue: String,
    strategy: String,
    initial_capital: Decimal,
    active: bool,
    created_at: DateTime<Utc>,
    metadata: Json,
) -> Account {
    let metadata: HashMap<String, Json> = match metadata {
        Json::Object(map) => map.into_iter().collect(),
        _ => HashMap::new(),
    };
    Account {
        id: Some(id),
        name,
        venue,
        strategy,
        initial_capital,
        active,
        created_at,
        metadata,
    }
}

/// Look up an account by its unique name.
pub async fn get_by_name(pool: &PgPool, name: &str) -> StoreResult<Account> {
    let row: Option<(i64, String, String, String, Decimal, bool, DateTime<Utc>, Json)> =
        sqlx::query_as(
            r#"
            SELECT id, name, venue, strategy, initial_capital, active, created_at, metadata
            FROM accounts.accounts
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;

    row.map(
        |(id, name, venue, strategy, initial_capital, active, created_at, metadata)| {
            row_to_account(id, name, venue, strategy, initial_capital, active, created_at, metadata)
        },
    )
    .ok_or_else(|| StoreError::AccountNotFound(name.to_string()))
}

/// Look up an account by its primary key. Used by the read API to
/// resolve portfolio-group member ids back to account names.
pub async fn get_by_id(pool: &PgPool, id: i64) -> StoreResult<Account> {
    let row: Option<(i64, String, String, String, Decimal, bool, DateTime<Utc>, Json)> =
        sqlx::query_as(
            r#"
            SELECT id, name, venue, strategy, initial_capital, active, created_at, metadata
            FROM accounts.accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(
        |(id, name, venue, strategy, initial_capital, active, created_at, metadata)| {
            row_to_account(id, name, venue, strategy, initial_capital, active, created_at, metadata)
        },
    )
    .ok_or_else(|| StoreError::AccountNotFound(id.to_string()))
}

/// All active accounts, ordered by name. Used at startup to decide
/// which paper engines to spawn.
pub async fn list_active(pool: &PgPool) -> StoreResult<Vec<Account>> {
    let rows: Vec<(i64, String, String, String, Decimal, bool, DateTime<Utc>, Json)> =
        sqlx::query_as(
            r#"
            SELECT id, name, venue, strategy, initial_capital, active, created_at, metadata
            FROM accounts.accounts
            WHERE active = TRUE
            ORDER BY name
            "#,
        )
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, venue, strategy, initial_capital, active, created_at, metadata)| {
            row_to_account(id, name, venue, strategy, initial_capital, active, created_at, metadata)
        })
        .collect())
}

/// Create a portfolio group if it does not already exist and return
/// its id.
pub async fn ensure_portfolio_group(
    pool: &PgPool,
    name: &str,
    description: Option<&str>,
) -> StoreResult<i64> {
    sqlx::query(
        r#"
        INSERT INTO accounts.portfolio_groups (name, description)
        VALUES ($1, $2)
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(description)
    .execute(pool)
    .await?;

    let (id,): (i64,) = sqlx::query_as("SELECT id FROM accounts.portfolio_groups WHERE name = $1")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

/// Add `account_id` to `portfolio_group_id`, a no-op if already a member.
pub async fn add_member(pool: &PgPool, portfolio_group_id: i64, account_id: i64) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO accounts.portfolio_members (portfolio_group_id, account_id)
        VALUES ($1, $2)
        ON CONFLICT (portfolio_group_id, account_id) DO NOTHING
        "#,
    )
    .bind(portfolio_group_id)
    .bind(account_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Account ids belonging to `portfolio_group_id`.
pub async fn member_account_ids(pool: &PgPool, portfolio_group_id: i64) -> StoreResult<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT account_id FROM accounts.portfolio_members WHERE portfolio_group_id = $1",
    )
    .bind(portfolio_group_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Look up a portfolio group by name.
pub async fn get_portfolio_group_by_name(pool: &PgPool, name: &str) -> StoreResult<PortfolioGroup> {
    let row: Option<(i64, String, Option<String>, DateTime<Utc>)> = sqlx::query_as(
        "SELECT id, name, description, created_at FROM accounts.portfolio_groups WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    row.map(|(id, name, description, created_at)| PortfolioGroup {
        id: Some(id),
        name,
        description,
        created_at,
    })
    .ok_or_else(|| StoreError::AccountNotFound(name.to_string()))
}
