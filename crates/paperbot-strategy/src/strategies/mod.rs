//! Concrete strategy implementations, one module per source file in the
//! reference Python strategy package.

pub mod contrarian;
pub mod funding;
pub mod funding_arb;
pub mod momentum;
pub mod rsi;

pub use contrarian::{ContrarianPure, ContrarianStrength};
pub use funding::{FundingOI, FundingRate};
pub use funding_arb::FundingArb;
pub use momentum::MomentumBreakout;
pub use rsi::RSIMeanReversion;
