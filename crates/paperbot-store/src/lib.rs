//! Relational persistence for the paper-trading platform.
//!
//! Backed by Postgres via `sqlx`. Four logical schemas: `market_data`
//! (immutable venue ingestion), `signals` (strategy output and its
//! consumption state), `accounts` (the primary multi-account engine
//! state), and `paper` (the legacy single-portfolio schema, kept for
//! compatibility — see [`legacy`]).

pub mod accounts;
pub mod error;
pub mod legacy;
pub mod market_data;
pub mod mtm;
pub mod pool;
pub mod positions;
pub mod signals;

pub use error::{StoreError, StoreResult};
pub use pool::{bootstrap, connect};
