//! Signal-generating strategies for the paper-trading engine.
//!
//! Each strategy takes a [`MarketSnapshot`](paperbot_core::model::MarketSnapshot)
//! and optionally emits a [`Signal`](paperbot_core::model::Signal). Strategies
//! are pure functions of their input snapshot plus their own parameters; they
//! hold no exchange connections or mutable market state.

pub mod error;
pub mod indicators;
pub mod params;
pub mod registry;
pub mod strategies;
pub mod strategy;

pub use error::{StrategyError, StrategyResult};
pub use indicators::{bollinger_bands, rsi};
pub use params::{decimal_param, i64_param, usize_param};
pub use registry::{builtin_strategies, StrategyRegistry};
pub use strategies::{
    ContrarianPure, ContrarianStrength, FundingArb, FundingOI, FundingRate, MomentumBreakout,
    RSIMeanReversion,
};
pub use strategy::{Strategy, StrategyDocs};
