//! Disk space monitor configuration.

use crate::options::{ConfigMap, Options};
use crate::validate::{check_ascending, check_at_least, check_percent, ValidationResult};
use ap_common::{ConfigSchema, FieldSpec};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_MONITORED_PATHS: &[&str] = &["/", "/var", "/tmp", "/home"];
pub const DEFAULT_EXCLUDE_TYPES: &[&str] = &["tmpfs", "devtmpfs", "proc", "sysfs"];

/// Validated disk monitor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskMonitorConfig {
    /// Warning threshold (percent used).
    pub threshold: f64,
    /// Critical threshold (percent used); strictly above `threshold`.
    pub critical_threshold: f64,
    /// Suggested polling interval for the host, in seconds.
    pub interval: u64,
    /// Seconds before the same filesystem/level may alert again.
    pub alert_cooldown: u64,
    /// Mount point prefixes to watch. Empty means every filesystem.
    pub monitored_paths: Vec<String>,
    /// Filesystem types to skip (case-insensitive).
    pub exclude_types: Vec<String>,
}

impl Default for DiskMonitorConfig {
    fn default() -> Self {
        Self {
            threshold: 85.0,
            critical_threshold: 95.0,
            interval: 300,
            alert_cooldown: 600,
            monitored_paths: DEFAULT_MONITORED_PATHS.iter().map(|s| s.to_string()).collect(),
            exclude_types: DEFAULT_EXCLUDE_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DiskMonitorConfig {
    /// Parse and validate options; absent options keep their defaults.
    pub fn from_options(map: &ConfigMap) -> ValidationResult<Self> {
        let defaults = Self::default();
        let opts = Options::new(map);

        let threshold = opts.f64_or("threshold", defaults.threshold)?;
        let critical_threshold = opts.f64_or("critical_threshold", defaults.critical_threshold)?;
        let interval = opts.i64_or("interval", defaults.interval as i64)?;
        let alert_cooldown = opts.i64_or("alert_cooldown", defaults.alert_cooldown as i64)?;

        check_percent("threshold", threshold)?;
        check_percent("critical_threshold", critical_threshold)?;
        check_ascending("threshold", threshold, "critical_threshold", critical_threshold)?;

        Ok(Self {
            threshold,
            critical_threshold,
            interval: check_at_least("interval", interval, 1)?,
            alert_cooldown: check_at_least("alert_cooldown", alert_cooldown, 0)?,
            monitored_paths: opts.string_list_or("monitored_paths", DEFAULT_MONITORED_PATHS)?,
            exclude_types: opts.string_list_or("exclude_types", DEFAULT_EXCLUDE_TYPES)?,
        })
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.alert_cooldown)
    }

    /// Whether a filesystem with this mount point and type should be watched.
    pub fn watches(&self, mountpoint: &str, fstype: &str) -> bool {
        if self
            .exclude_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(fstype))
        {
            return false;
        }
        self.monitored_paths.is_empty()
            || self
                .monitored_paths
                .iter()
                .any(|p| mountpoint.starts_with(p.as_str()))
    }

    /// Schema returned by `get_trigger_config`.
    pub fn schema() -> ConfigSchema {
        ConfigSchema::new("Disk space monitoring configuration")
            .field(
                "threshold",
                FieldSpec::new("number", "Disk usage threshold percentage (0-100)")
                    .default_value(85.0)
                    .minimum(0.0)
                    .maximum(100.0),
            )
            .field(
                "critical_threshold",
                FieldSpec::new("number", "Critical disk usage threshold percentage (0-100)")
                    .default_value(95.0)
                    .minimum(0.0)
                    .maximum(100.0),
            )
            .field(
                "interval",
                FieldSpec::new("integer", "Monitoring interval in seconds")
                    .default_value(300)
                    .minimum(1)
                    .examples([json!(60), json!(300), json!(600)]),
            )
            .field(
                "monitored_paths",
                FieldSpec::new("array", "List of filesystem paths to monitor")
                    .default_value(json!(DEFAULT_MONITORED_PATHS))
                    .items("string"),
            )
            .field(
                "exclude_types",
                FieldSpec::new("array", "Filesystem types to exclude from monitoring")
                    .default_value(json!(DEFAULT_EXCLUDE_TYPES))
                    .items("string"),
            )
            .field(
                "alert_cooldown",
                FieldSpec::new(
                    "integer",
                    "Cooldown period between alerts for same filesystem (seconds)",
                )
                .default_value(600)
                .minimum(60),
            )
            .example(json!({
                "threshold": 85.0,
                "critical_threshold": 95.0,
                "interval": 300,
                "monitored_paths": ["/", "/var"]
            }))
            .example(json!({
                "threshold": 90.0,
                "critical_threshold": 98.0,
                "interval": 600,
                "exclude_types": ["tmpfs", "devtmpfs"]
            }))
    }
}
