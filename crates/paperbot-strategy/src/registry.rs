//! Strategy registry: maps each configured strategy name to a boxed
//! instance, mirroring the reference `STRATEGY_REGISTRY` dict.

use crate::error::{StrategyError, StrategyResult};
use crate::strategies::{
    ContrarianPure, ContrarianStrength, FundingArb, FundingOI, FundingRate, MomentumBreakout,
    RSIMeanReversion,
};
use crate::strategy::Strategy;
use serde_json::Value as Json;
use std::collections::HashMap;

/// Construct every strategy this crate knows about, with default
/// parameters. Operators select a subset by name via config.
pub fn builtin_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(ContrarianPure::default()),
        Box::new(ContrarianStrength::default()),
        Box::new(FundingRate::default()),
        Box::new(FundingOI::default()),
        Box::new(FundingArb::default()),
        Box::new(RSIMeanReversion::default()),
        Box::new(MomentumBreakout::default()),
    ]
}

/// Construct the named builtin strategy with `params` applied as
/// overrides on top of its defaults. `None` if `name` isn't a known
/// strategy.
pub fn builtin_strategy_by_name(name: &str, params: &HashMap<String, Json>) -> Option<Box<dyn Strategy>> {
    match name {
        "contrarian_pure" => Some(Box::new(ContrarianPure::from_params(params))),
        "contrarian_strength" => Some(Box::new(ContrarianStrength::from_params(params))),
        "funding_rate" => Some(Box::new(FundingRate::from_params(params))),
        "funding_oi" => Some(Box::new(FundingOI::from_params(params))),
        "funding_arb" => Some(Box::new(FundingArb::from_params(params))),
        "rsi_mean_reversion" => Some(Box::new(RSIMeanReversion::from_params(params))),
        "momentum_breakout" => Some(Box::new(MomentumBreakout::from_params(params))),
        _ => None,
    }
}

/// Holds the active set of strategies, keyed by name, rejecting
/// duplicates at registration time.
pub struct StrategyRegistry {
    strategies: HashMap<String, Box<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    pub fn register(&mut self, strategy: Box<dyn Strategy>) -> StrategyResult<()> {
        let name = strategy.name().to_string();
        if self.strategies.contains_key(&name) {
            return Err(StrategyError::DuplicateName(name));
        }
        self.strategies.insert(name, strategy);
        Ok(())
    }

    /// Build a registry from `configured`, a map of enabled strategy
    /// name to its `params` override table. An empty map means "all
    /// builtins, with their defaults". Unknown strategy names are ignored.
    pub fn from_enabled_with_params(configured: &HashMap<String, HashMap<String, Json>>) -> StrategyResult<Self> {
        let mut registry = Self::new();
        if configured.is_empty() {
            for strategy in builtin_strategies() {
                registry.register(strategy)?;
            }
            return Ok(registry);
        }
        for (name, params) in configured {
            if let Some(strategy) = builtin_strategy_by_name(name, params) {
                registry.register(strategy)?;
            }
        }
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Strategy> {
        self.strategies.get(name).map(|s| s.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Strategy> {
        self.strategies.values().map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_strategies_have_unique_names() {
        let mut registry = StrategyRegistry::new();
        for strategy in builtin_strategies() {
            registry.register(strategy).unwrap();
        }
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn duplicate_registration_errors() {
        let mut registry = StrategyRegistry::new();
        registry
            .register(Box::new(ContrarianPure::default()))
            .unwrap();
        let err = registry.register(Box::new(ContrarianPure::default()));
        assert!(err.is_err());
    }

    #[test]
    fn from_enabled_with_params_empty_means_all_defaults() {
        let registry = StrategyRegistry::from_enabled_with_params(&HashMap::new()).unwrap();
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn from_enabled_with_params_applies_overrides() {
        use chrono::Utc;
        use paperbot_core::decimal::Price;
        use paperbot_core::model::{FundingSnapshot, MarketSnapshot};
        use rust_decimal_macros::dec;

        let mut params = HashMap::new();
        params.insert("threshold".to_string(), serde_json::json!("0.002"));
        let mut configured = HashMap::new();
        configured.insert("funding_arb".to_string(), params);

        let registry = StrategyRegistry::from_enabled_with_params(&configured).unwrap();
        assert_eq!(registry.len(), 1);
        let strategy = registry.get("funding_arb").unwrap();

        // 0.001 clears the strategy's default threshold (0.0005) but not
        // the configured override (0.002); a signal here would mean the
        // override was never applied.
        let snapshot = MarketSnapshot {
            asset: "ETH".to_string(),
            ts: Utc::now(),
            candles: vec![],
            funding: vec![FundingSnapshot {
                venue: "hyperliquid".to_string(),
                asset: "ETH".to_string(),
                ts: Utc::now(),
                funding_rate: dec!(0.001),
                open_interest: None,
                mark_price: Some(Price::new(dec!(3000))),
            }],
            polymarket: vec![],
        };
        assert!(strategy.evaluate(&snapshot).is_none());
    }

    #[test]
    fn from_enabled_with_params_ignores_unknown_names() {
        let mut configured = HashMap::new();
        configured.insert("not_a_real_strategy".to_string(), HashMap::new());
        let registry = StrategyRegistry::from_enabled_with_params(&configured).unwrap();
        assert!(registry.is_empty());
    }
}
