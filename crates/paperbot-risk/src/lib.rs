//! Risk controls for the paper-trading engine: per-strategy daily-loss
//! and cooldown tracking, plus stateless position/exposure limits.
//!
//! Grounded structurally on the teacher's hard-gate module (mutable
//! tracker state, short-circuit composite check) and in content on
//! the reference `paper/risk.py` implementation.

pub mod error;
pub mod gates;
pub mod tracker;

pub use error::{RiskError, RiskResult};
pub use gates::{
    check_max_positions_per_strategy, check_max_total_exposure, evaluate_risk, RiskLimits,
    RiskVerdict,
};
pub use tracker::RiskTracker;
