//! Exit condition checking for open paper positions.
//!
//! Pure functions only: no store or oracle dependency. The paper
//! engine supplies a current price and decides what to do with the
//! verdict.

pub mod exit_watcher;

pub use exit_watcher::{check_exit, stop_price, take_profit_price};
