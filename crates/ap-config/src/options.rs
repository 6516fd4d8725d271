//! Lenient readers over the raw option map sent with `initialize`.
//!
//! Hosts frequently send numbers as strings (`"85"`), so numeric readers
//! accept both. An explicit `null` is treated the same as an absent key.

use crate::validate::{ConfigError, ValidationResult};
use serde_json::Value;

/// Raw option map as received on the wire.
pub type ConfigMap = serde_json::Map<String, Value>;

/// Typed accessors with defaults over a [`ConfigMap`].
#[derive(Debug, Clone, Copy)]
pub struct Options<'a> {
    map: &'a ConfigMap,
}

impl<'a> Options<'a> {
    pub fn new(map: &'a ConfigMap) -> Self {
        Self { map }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.map.get(field).filter(|v| !v.is_null())
    }

    /// Whether the option was supplied (and not null).
    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn f64_or(&self, field: &str, default: f64) -> ValidationResult<f64> {
        match self.get(field) {
            None => Ok(default),
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| invalid(field, "a number")),
            Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid(field, "a number")),
            Some(_) => Err(invalid(field, "a number")),
        }
    }

    /// Integers; fractional numbers are truncated toward zero.
    pub fn i64_or(&self, field: &str, default: i64) -> ValidationResult<i64> {
        match self.get(field) {
            None => Ok(default),
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                .ok_or_else(|| invalid(field, "an integer")),
            Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid(field, "an integer")),
            Some(_) => Err(invalid(field, "an integer")),
        }
    }

    pub fn bool_or(&self, field: &str, default: bool) -> ValidationResult<bool> {
        match self.get(field) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(invalid(field, "a boolean")),
            },
            Some(_) => Err(invalid(field, "a boolean")),
        }
    }

    pub fn string_or(&self, field: &str, default: &str) -> ValidationResult<String> {
        match self.get(field) {
            None => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err(invalid(field, "a string")),
        }
    }

    /// A list of strings; a bare string is accepted as a one-element list.
    pub fn string_list_or(&self, field: &str, default: &[&str]) -> ValidationResult<Vec<String>> {
        match self.get(field) {
            None => Ok(default.iter().map(|s| s.to_string()).collect()),
            Some(value) => string_list(field, value),
        }
    }
}

/// Interpret a JSON value as a list of strings.
pub fn string_list(field: &str, value: &Value) -> ValidationResult<Vec<String>> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(invalid(field, "a list of strings")),
            })
            .collect(),
        _ => Err(invalid(field, "a list of strings")),
    }
}

fn invalid(field: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidType {
        field: field.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> ConfigMap {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn numbers_accept_numeric_strings() {
        let m = map(json!({"threshold": "87.5", "interval": "30"}));
        let opts = Options::new(&m);
        assert_eq!(opts.f64_or("threshold", 0.0).unwrap(), 87.5);
        assert_eq!(opts.i64_or("interval", 0).unwrap(), 30);
    }

    #[test]
    fn missing_and_null_use_default() {
        let m = map(json!({"threshold": null}));
        let opts = Options::new(&m);
        assert_eq!(opts.f64_or("threshold", 85.0).unwrap(), 85.0);
        assert_eq!(opts.i64_or("interval", 300).unwrap(), 300);
        assert!(!opts.has("threshold"));
    }

    #[test]
    fn fractional_integer_truncates() {
        let m = map(json!({"timeout": 12.9}));
        assert_eq!(Options::new(&m).i64_or("timeout", 0).unwrap(), 12);
    }

    #[test]
    fn wrong_types_rejected() {
        let m = map(json!({"threshold": "high", "use_tls": 3, "paths": [1, 2]}));
        let opts = Options::new(&m);
        assert!(opts.f64_or("threshold", 0.0).is_err());
        assert!(opts.bool_or("use_tls", true).is_err());
        assert!(opts.string_list_or("paths", &[]).is_err());
    }

    #[test]
    fn bare_string_is_single_item_list() {
        let m = map(json!({"to": "ops@example.com"}));
        assert_eq!(
            Options::new(&m).string_list_or("to", &[]).unwrap(),
            vec!["ops@example.com".to_string()]
        );
    }

    #[test]
    fn bool_strings() {
        let m = map(json!({"a": "TRUE", "b": "off"}));
        let opts = Options::new(&m);
        assert!(opts.bool_or("a", false).unwrap());
        assert!(!opts.bool_or("b", true).unwrap());
    }
}
