//! Connection pool and idempotent schema bootstrap.
//!
//! Schema migrations proper are out of scope (§1); this module only
//! creates the four logical schemas and their tables if they do not
//! already exist, so a fresh database is usable without an external
//! migration runner.

use crate::error::StoreResult;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Open a connection pool to `database_url`.
pub async fn connect(database_url: &str) -> StoreResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Create all schemas/tables if they do not already exist.
pub async fn bootstrap(pool: &PgPool) -> StoreResult<()> {
    sqlx::query(BOOTSTRAP_SQL).execute(pool).await?;
    Ok(())
}

const BOOTSTRAP_SQL: &str = r#"
CREATE SCHEMA IF NOT EXISTS market_data;
CREATE SCHEMA IF NOT EXISTS signals;
CREATE SCHEMA IF NOT EXISTS paper;
CREATE SCHEMA IF NOT EXISTS accounts;

CREATE TABLE IF NOT EXISTS market_data.candles (
    id BIGSERIAL PRIMARY KEY,
    venue TEXT NOT NULL,
    asset TEXT NOT NULL,
    interval TEXT NOT NULL,
    open_time TIMESTAMPTZ NOT NULL,
    open NUMERIC NOT NULL,
    high NUMERIC NOT NULL,
    low NUMERIC NOT NULL,
    close NUMERIC NOT NULL,
    volume NUMERIC NOT NULL,
    UNIQUE (venue, asset, interval, open_time)
);

CREATE TABLE IF NOT EXISTS market_data.funding_snapshots (
    id BIGSERIAL PRIMARY KEY,
    venue TEXT NOT NULL,
    asset TEXT NOT NULL,
    ts TIMESTAMPTZ NOT NULL,
    funding_rate NUMERIC NOT NULL,
    open_interest NUMERIC,
    mark_price NUMERIC,
    UNIQUE (venue, asset, ts)
);

CREATE TABLE IF NOT EXISTS market_data.prediction_market_observations (
    id BIGSERIAL PRIMARY KEY,
    market_id TEXT NOT NULL,
    market_title TEXT NOT NULL,
    asset TEXT NOT NULL,
    ts TIMESTAMPTZ NOT NULL,
    yes_price NUMERIC,
    no_price NUMERIC,
    volume_24h NUMERIC,
    liquidity NUMERIC,
    end_date TIMESTAMPTZ,
    UNIQUE (market_id, ts)
);

CREATE TABLE IF NOT EXISTS signals.signals (
    id BIGSERIAL PRIMARY KEY,
    ts TIMESTAMPTZ NOT NULL,
    strategy TEXT NOT NULL,
    asset TEXT NOT NULL,
    exchange TEXT NOT NULL,
    direction TEXT NOT NULL,
    confidence DOUBLE PRECISION NOT NULL,
    entry_price NUMERIC NOT NULL,
    metadata JSONB NOT NULL DEFAULT '{}',
    acted_on BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE INDEX IF NOT EXISTS idx_signals_unconsumed
    ON signals.signals (exchange, strategy, ts)
    WHERE acted_on = FALSE;

-- Legacy single-portfolio schema, retained for backward compatibility.
CREATE TABLE IF NOT EXISTS paper.portfolios (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    initial_capital NUMERIC NOT NULL DEFAULT 10000,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS paper.positions (
    id BIGSERIAL PRIMARY KEY,
    portfolio_id BIGINT NOT NULL REFERENCES paper.portfolios(id) ON DELETE CASCADE,
    strategy TEXT NOT NULL,
    asset TEXT NOT NULL,
    exchange TEXT NOT NULL,
    direction TEXT NOT NULL,
    entry_price NUMERIC NOT NULL,
    entry_ts TIMESTAMPTZ NOT NULL,
    quantity NUMERIC NOT NULL,
    exit_price NUMERIC,
    exit_ts TIMESTAMPTZ,
    exit_reason TEXT,
    realised_pnl NUMERIC,
    status TEXT NOT NULL DEFAULT 'OPEN',
    signal_id BIGINT,
    metadata JSONB NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS paper.mark_to_market (
    id BIGSERIAL PRIMARY KEY,
    portfolio_id BIGINT NOT NULL REFERENCES paper.portfolios(id) ON DELETE CASCADE,
    ts TIMESTAMPTZ NOT NULL,
    total_equity NUMERIC NOT NULL,
    unrealised_pnl NUMERIC NOT NULL,
    realised_pnl NUMERIC NOT NULL,
    open_positions BIGINT NOT NULL,
    breakdown JSONB NOT NULL DEFAULT '{}'
);

-- Primary multi-account schema.
CREATE TABLE IF NOT EXISTS accounts.accounts (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    venue TEXT NOT NULL,
    strategy TEXT NOT NULL,
    initial_capital NUMERIC NOT NULL DEFAULT 10000,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    metadata JSONB NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS accounts.portfolio_groups (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS accounts.portfolio_members (
    portfolio_group_id BIGINT NOT NULL REFERENCES accounts.portfolio_groups(id) ON DELETE CASCADE,
    account_id BIGINT NOT NULL REFERENCES accounts.accounts(id) ON DELETE CASCADE,
    UNIQUE (portfolio_group_id, account_id)
);

CREATE TABLE IF NOT EXISTS accounts.account_positions (
    id BIGSERIAL PRIMARY KEY,
    account_id BIGINT NOT NULL REFERENCES accounts.accounts(id) ON DELETE CASCADE,
    strategy TEXT NOT NULL,
    asset TEXT NOT NULL,
    exchange TEXT NOT NULL,
    direction TEXT NOT NULL,
    entry_price NUMERIC NOT NULL,
    entry_ts TIMESTAMPTZ NOT NULL,
    quantity NUMERIC NOT NULL,
    exit_price NUMERIC,
    exit_ts TIMESTAMPTZ,
    exit_reason TEXT,
    realised_pnl NUMERIC,
    status TEXT NOT NULL DEFAULT 'OPEN',
    signal_id BIGINT REFERENCES signals.signals(id),
    metadata JSONB NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_account_positions_open
    ON accounts.account_positions (account_id, strategy)
    WHERE status = 'OPEN';

CREATE TABLE IF NOT EXISTS accounts.account_mark_to_market (
    id BIGSERIAL PRIMARY KEY,
    account_id BIGINT NOT NULL REFERENCES accounts.accounts(id) ON DELETE CASCADE,
    ts TIMESTAMPTZ NOT NULL,
    total_equity NUMERIC NOT NULL,
    unrealised_pnl NUMERIC NOT NULL,
    realised_pnl NUMERIC NOT NULL,
    open_positions BIGINT NOT NULL,
    breakdown JSONB NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_account_mtm_account_ts
    ON accounts.account_mark_to_market (account_id, ts);
"#;
