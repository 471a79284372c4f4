//! Paper engine tick loop: consume signals, open positions, check
//! exits, and periodically snapshot mark-to-market.
//!
//! Grounded on `original_source/.../paper/runner.py::run_loop` and the
//! collector poll-loop idiom (`tokio::select!` over a sleep and a
//! cancellation token).

use crate::engine::PaperEngine;
use chrono::Utc;
use sqlx::PgPool;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const TICK_INTERVAL: Duration = Duration::from_secs(5);
const MTM_INTERVAL: Duration = Duration::from_secs(60);

/// Drive one engine's tick loop until `cancel` fires.
pub async fn run_loop(engine: PaperEngine, pool: PgPool, cancel: CancellationToken) {
    info!(account_id = engine.account_id(), "paper_engine_started");
    let mut last_mtm = Instant::now() - MTM_INTERVAL;

    loop {
        if let Err(e) = tick(&engine, &pool, &mut last_mtm).await {
            error!(account_id = engine.account_id(), error = %e, "tick_error");
        }

        tokio::select! {
            _ = tokio::time::sleep(TICK_INTERVAL) => {}
            _ = cancel.cancelled() => break,
        }
    }
    info!(account_id = engine.account_id(), "paper_engine_stopped");
}

async fn tick(engine: &PaperEngine, pool: &PgPool, last_mtm: &mut Instant) -> crate::error::PaperResult<()> {
    let now = Utc::now();

    let signals = engine.consume_signals(pool).await?;
    for signal in &signals {
        let equity = engine.current_equity(pool).await?;
        let verdict = engine.check_risk(pool, signal, equity, now).await?;
        if !verdict.allowed {
            info!(strategy = %signal.strategy, asset = %signal.asset, reason = %verdict.reason, "signal_rejected_by_risk");
            continue;
        }
        engine.open_position(pool, signal, equity).await?;
    }

    engine.check_exits(pool, now).await?;

    if last_mtm.elapsed() >= MTM_INTERVAL {
        engine.write_mark_to_market(pool, now).await?;
        *last_mtm = Instant::now();
    }

    Ok(())
}
