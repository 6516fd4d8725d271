//! Memory monitor configuration.

use crate::options::{ConfigMap, Options};
use crate::validate::{check_ascending, check_at_least, check_percent, ValidationResult};
use ap_common::{ConfigSchema, FieldSpec};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// Validated memory monitor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMonitorConfig {
    /// RAM warning threshold (percent used).
    pub memory_threshold: f64,
    /// Swap warning threshold (percent used).
    pub swap_threshold: f64,
    /// Critical level shared by RAM and swap; above both warning thresholds.
    pub critical_threshold: f64,
    pub interval: u64,
    pub alert_cooldown: u64,
}

impl Default for MemoryMonitorConfig {
    fn default() -> Self {
        Self {
            memory_threshold: 85.0,
            swap_threshold: 90.0,
            critical_threshold: 95.0,
            interval: 60,
            alert_cooldown: 300,
        }
    }
}

impl MemoryMonitorConfig {
    pub fn from_options(map: &ConfigMap) -> ValidationResult<Self> {
        let defaults = Self::default();
        let opts = Options::new(map);

        let memory_threshold = opts.f64_or("memory_threshold", defaults.memory_threshold)?;
        let swap_threshold = opts.f64_or("swap_threshold", defaults.swap_threshold)?;
        let critical_threshold = opts.f64_or("critical_threshold", defaults.critical_threshold)?;
        let interval = opts.i64_or("interval", defaults.interval as i64)?;
        let alert_cooldown = opts.i64_or("alert_cooldown", defaults.alert_cooldown as i64)?;

        check_percent("memory_threshold", memory_threshold)?;
        check_percent("swap_threshold", swap_threshold)?;
        check_percent("critical_threshold", critical_threshold)?;
        check_ascending(
            "memory_threshold",
            memory_threshold,
            "critical_threshold",
            critical_threshold,
        )?;
        check_ascending(
            "swap_threshold",
            swap_threshold,
            "critical_threshold",
            critical_threshold,
        )?;

        Ok(Self {
            memory_threshold,
            swap_threshold,
            critical_threshold,
            interval: check_at_least("interval", interval, 1)?,
            alert_cooldown: check_at_least("alert_cooldown", alert_cooldown, 0)?,
        })
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.alert_cooldown)
    }

    /// Schema returned by `get_trigger_config`.
    pub fn schema() -> ConfigSchema {
        ConfigSchema::new("Memory monitoring configuration")
            .field(
                "memory_threshold",
                FieldSpec::new("number", "Memory usage threshold percentage (0-100)")
                    .default_value(85.0)
                    .minimum(0.0)
                    .maximum(100.0),
            )
            .field(
                "swap_threshold",
                FieldSpec::new("number", "Swap usage threshold percentage (0-100)")
                    .default_value(90.0)
                    .minimum(0.0)
                    .maximum(100.0),
            )
            .field(
                "critical_threshold",
                FieldSpec::new(
                    "number",
                    "Critical usage percentage for both memory and swap (0-100)",
                )
                .default_value(95.0)
                .minimum(0.0)
                .maximum(100.0),
            )
            .field(
                "interval",
                FieldSpec::new("integer", "Monitoring interval in seconds")
                    .default_value(60)
                    .minimum(1)
                    .examples([json!(30), json!(60), json!(300)]),
            )
            .field(
                "alert_cooldown",
                FieldSpec::new(
                    "integer",
                    "Cooldown period between alerts of same type (seconds)",
                )
                .default_value(300)
                .minimum(60),
            )
            .example(json!({
                "memory_threshold": 85.0,
                "swap_threshold": 90.0,
                "interval": 60
            }))
            .example(json!({
                "memory_threshold": 90.0,
                "swap_threshold": 92.0,
                "interval": 30,
                "alert_cooldown": 600
            }))
    }
}
