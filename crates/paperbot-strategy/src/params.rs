//! Helpers for reading per-strategy config overrides out of a loose
//! `HashMap<String, Json>`, mirroring the reference strategies' own
//! `self.params.get(key, default)` pattern.

use rust_decimal::Decimal;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::str::FromStr;

/// Read a `Decimal` override for `key`, accepting either a JSON number
/// or a string (TOML floats arrive as numbers; hand-edited overrides
/// are often quoted to avoid float rounding). Falls back to `default`
/// if the key is absent or doesn't parse.
pub fn decimal_param(params: &HashMap<String, Json>, key: &str, default: Decimal) -> Decimal {
    match params.get(key) {
        Some(Json::String(s)) => Decimal::from_str(s).unwrap_or(default),
        Some(Json::Number(n)) => n.as_f64().and_then(|f| Decimal::try_from(f).ok()).unwrap_or(default),
        _ => default,
    }
}

/// Read a `usize` override for `key`, falling back to `default`.
pub fn usize_param(params: &HashMap<String, Json>, key: &str, default: usize) -> usize {
    match params.get(key) {
        Some(Json::Number(n)) => n.as_u64().map(|v| v as usize).unwrap_or(default),
        Some(Json::String(s)) => s.parse().unwrap_or(default),
        _ => default,
    }
}

/// Read an `i64` override for `key`, falling back to `default`.
pub fn i64_param(params: &HashMap<String, Json>, key: &str, default: i64) -> i64 {
    match params.get(key) {
        Some(Json::Number(n)) => n.as_i64().unwrap_or(default),
        Some(Json::String(s)) => s.parse().unwrap_or(default),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decimal_param_reads_string_override() {
        let mut params = HashMap::new();
        params.insert("threshold".to_string(), json!("0.002"));
        assert_eq!(decimal_param(&params, "threshold", Decimal::ZERO), Decimal::new(2, 3));
    }

    #[test]
    fn decimal_param_reads_number_override() {
        let mut params = HashMap::new();
        params.insert("threshold".to_string(), json!(0.5));
        assert_eq!(decimal_param(&params, "threshold", Decimal::ZERO), Decimal::new(5, 1));
    }

    #[test]
    fn decimal_param_falls_back_to_default_when_absent() {
        let params = HashMap::new();
        assert_eq!(decimal_param(&params, "threshold", Decimal::ONE), Decimal::ONE);
    }

    #[test]
    fn usize_param_reads_number_override() {
        let mut params = HashMap::new();
        params.insert("period".to_string(), json!(21));
        assert_eq!(usize_param(&params, "period", 14), 21);
    }

    #[test]
    fn i64_param_falls_back_on_wrong_type() {
        let mut params = HashMap::new();
        params.insert("min_days".to_string(), json!(true));
        assert_eq!(i64_param(&params, "min_days", 1), 1);
    }
}
