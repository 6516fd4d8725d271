//! Plugin traits.
//!
//! A plugin is either an action (does something on request) or a trigger
//! (reports threshold crossings when polled). Both share [`PluginCore`]:
//! static metadata, configuration, and health metrics. Lifecycle, cooldowns
//! and result normalization live in the runtime, not in plugins.

use crate::source::{FilesystemUsage, MemorySnapshot, SourceError};
use ap_common::{AlertLevel, ConfigSchema, Parameters, PluginKind, TriggerEvent};
use ap_config::{ConfigError, ConfigMap};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;

pub const PLUGIN_VERSION: &str = "1.0.0";
pub const PLUGIN_AUTHOR: &str = "Stavily Team";
pub const PLUGIN_LICENSE: &str = "MIT";

/// Static metadata returned by `get_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: PluginKind,
    pub tags: &'static [&'static str],
    pub categories: &'static [&'static str],
}

/// Behaviour shared by every plugin.
pub trait PluginCore {
    fn descriptor(&self) -> &'static PluginDescriptor;

    /// Validate and adopt new options. On error the previous configuration
    /// stays in effect.
    fn configure(&mut self, options: &ConfigMap) -> Result<(), ConfigError>;

    /// Plugin-specific `metrics` object for `get_health`.
    fn health_metrics(&self) -> Value;
}

// ── Action plugins ──────────────────────────────────────────────────────

/// What an action plugin made of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The action ran and succeeded.
    Completed(Value),
    /// Parameters failed validation; nothing was executed.
    Rejected(String),
    /// The action ran (or tried to) and failed; `data` holds partial output.
    Failed { error: String, data: Option<Value> },
}

pub trait ActionPlugin: PluginCore {
    /// Schema of `execute_action` parameters.
    fn request_schema(&self) -> ConfigSchema;

    /// Validate and run one request. Exactly one attempt, no retries.
    fn execute(&self, parameters: &Parameters) -> ActionOutcome;
}

// ── Trigger plugins ─────────────────────────────────────────────────────

/// Ascending alert thresholds for one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warning: f64,
    pub critical: f64,
}

impl Thresholds {
    /// `critical` wins over `warning`; below `warning` is no alert.
    pub fn classify(&self, usage: f64) -> Option<AlertLevel> {
        if usage >= self.critical {
            Some(AlertLevel::Critical)
        } else if usage >= self.warning {
            Some(AlertLevel::Warning)
        } else {
            None
        }
    }

    pub fn for_level(&self, level: AlertLevel) -> f64 {
        match level {
            AlertLevel::Warning => self.warning,
            AlertLevel::Critical => self.critical,
        }
    }
}

/// Raw data behind a reading, passed back to the plugin to build events.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricSnapshot {
    Filesystem(FilesystemUsage),
    Memory(MemorySnapshot),
}

/// One classified sub-metric (a filesystem, RAM, swap).
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Stable identity used in alert keys (mount point, `memory`, `swap`).
    pub metric: String,
    pub usage_percent: f64,
    pub thresholds: Thresholds,
    pub snapshot: MetricSnapshot,
}

pub trait TriggerPlugin: PluginCore {
    /// Schema of the configuration options.
    fn trigger_schema(&self) -> ConfigSchema;

    /// Current readings in scan order.
    fn readings(&self) -> Result<Vec<Reading>, SourceError>;

    /// Minimum time between two alerts for the same key.
    fn cooldown(&self) -> Duration;

    fn build_event(&self, reading: &Reading, level: AlertLevel, at: DateTime<Utc>)
        -> TriggerEvent;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_boundaries() {
        let t = Thresholds {
            warning: 85.0,
            critical: 95.0,
        };
        assert_eq!(t.classify(84.99), None);
        assert_eq!(t.classify(85.0), Some(AlertLevel::Warning));
        assert_eq!(t.classify(94.99), Some(AlertLevel::Warning));
        assert_eq!(t.classify(95.0), Some(AlertLevel::Critical));
        assert_eq!(t.classify(100.0), Some(AlertLevel::Critical));
    }

    #[test]
    fn threshold_for_level() {
        let t = Thresholds {
            warning: 70.0,
            critical: 90.0,
        };
        assert_eq!(t.for_level(AlertLevel::Warning), 70.0);
        assert_eq!(t.for_level(AlertLevel::Critical), 90.0);
    }
}
