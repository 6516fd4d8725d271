//! RAM and swap monitor.

use super::event_metadata;
use crate::host::HostInfo;
use crate::plugin::{
    MetricSnapshot, PluginCore, PluginDescriptor, Reading, Thresholds, TriggerPlugin,
};
use crate::source::{gib, MemorySnapshot, MemorySource, SourceError};
use ap_common::{tag_set, AlertLevel, ConfigSchema, EventId, PluginKind, Severity, TriggerEvent};
use ap_config::{ConfigError, ConfigMap, MemoryMonitorConfig};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

pub static DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    id: "memory-monitor",
    name: "Memory Monitor",
    description: "Monitors RAM and swap usage with configurable thresholds",
    kind: PluginKind::Trigger,
    tags: &["system", "monitoring", "memory", "ram", "swap"],
    categories: &["system-monitoring"],
};

const MEMORY: &str = "memory";
const SWAP: &str = "swap";

pub struct MemoryMonitor {
    config: MemoryMonitorConfig,
    source: Box<dyn MemorySource>,
    host: HostInfo,
}

impl MemoryMonitor {
    pub fn new(source: Box<dyn MemorySource>, host: HostInfo) -> Self {
        Self {
            config: MemoryMonitorConfig::default(),
            source,
            host,
        }
    }

    pub fn config(&self) -> &MemoryMonitorConfig {
        &self.config
    }
}

/// Severity grows with usage independently of the configured thresholds.
fn severity(metric: &str, usage: f64) -> Severity {
    match metric {
        MEMORY if usage > 95.0 => Severity::Critical,
        MEMORY if usage > 90.0 => Severity::High,
        MEMORY => Severity::Medium,
        _ if usage > 95.0 => Severity::Critical,
        _ => Severity::High,
    }
}

impl PluginCore for MemoryMonitor {
    fn descriptor(&self) -> &'static PluginDescriptor {
        &DESCRIPTOR
    }

    fn configure(&mut self, options: &ConfigMap) -> Result<(), ConfigError> {
        self.config = MemoryMonitorConfig::from_options(options)?;
        Ok(())
    }

    fn health_metrics(&self) -> Value {
        let mut metrics = json!({
            "memory_threshold": self.config.memory_threshold,
            "swap_threshold": self.config.swap_threshold,
            "critical_threshold": self.config.critical_threshold,
        });
        match self.source.snapshot() {
            Ok(snap) => {
                metrics["current_memory_percent"] = json!(snap.memory_percent);
                metrics["current_swap_percent"] = json!(snap.swap_percent);
                metrics["total_memory_gb"] = json!(gib(snap.total_memory));
                metrics["available_memory_gb"] = json!(gib(snap.available_memory));
            }
            Err(err) => {
                warn!(error = %err, "memory health probe failed");
                metrics["error"] = json!(err.to_string());
            }
        }
        metrics
    }
}

impl TriggerPlugin for MemoryMonitor {
    fn trigger_schema(&self) -> ConfigSchema {
        MemoryMonitorConfig::schema()
    }

    fn readings(&self) -> Result<Vec<Reading>, SourceError> {
        let snap: MemorySnapshot = self.source.snapshot()?;
        let critical = self.config.critical_threshold;
        Ok(vec![
            Reading {
                metric: MEMORY.to_string(),
                usage_percent: snap.memory_percent,
                thresholds: Thresholds {
                    warning: self.config.memory_threshold,
                    critical,
                },
                snapshot: MetricSnapshot::Memory(snap.clone()),
            },
            Reading {
                metric: SWAP.to_string(),
                usage_percent: snap.swap_percent,
                thresholds: Thresholds {
                    warning: self.config.swap_threshold,
                    critical,
                },
                snapshot: MetricSnapshot::Memory(snap),
            },
        ])
    }

    fn cooldown(&self) -> Duration {
        self.config.cooldown()
    }

    fn build_event(&self, reading: &Reading, level: AlertLevel, at: DateTime<Utc>) -> TriggerEvent {
        let metric = reading.metric.as_str();
        let level_name = level.to_string();
        let memory_info = match &reading.snapshot {
            MetricSnapshot::Memory(snap) => json!(snap),
            MetricSnapshot::Filesystem(_) => Value::Null,
        };

        TriggerEvent {
            id: EventId::new("memory", &[metric, level_name.as_str()], at),
            event_type: format!("{metric}.high"),
            source: DESCRIPTOR.id.to_string(),
            timestamp: at,
            data: json!({
                "alert_type": metric,
                "alert_level": level,
                "usage_percent": reading.usage_percent,
                "threshold": reading.thresholds.for_level(level),
                "memory_info": memory_info,
                "system_info": {
                    "hostname": self.host.hostname,
                    "platform": self.host.platform,
                    "architecture": self.host.architecture,
                },
            }),
            metadata: event_metadata(&DESCRIPTOR, &self.host),
            tags: tag_set(["system", "memory", metric, "alert", level_name.as_str()]),
            severity: severity(metric, reading.usage_percent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SimulatedMemory;
    use crate::trigger::TriggerDetector;
    use chrono::TimeZone;

    struct Pinned(MemorySnapshot);

    impl MemorySource for Pinned {
        fn snapshot(&self) -> Result<MemorySnapshot, SourceError> {
            Ok(self.0.clone())
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn pinned(memory_pct: u64, swap_pct: u64) -> MemoryMonitor {
        let snap = MemorySnapshot::from_bytes(100, 100 - memory_pct, memory_pct, 100, swap_pct);
        MemoryMonitor::new(Box::new(Pinned(snap)), HostInfo::detect())
    }

    #[test]
    fn simulated_memory_fires_warning() {
        let monitor = MemoryMonitor::new(Box::new(SimulatedMemory), HostInfo::detect());
        let mut detector = TriggerDetector::new(Box::new(monitor));
        let event = detector.detect(at()).unwrap().unwrap();

        assert_eq!(event.event_type, "memory.high");
        assert_eq!(event.id.0, format!("memory-memory-warning-{}", at().timestamp()));
        assert_eq!(event.data["alert_type"], "memory");
        assert_eq!(event.data["alert_level"], "warning");
        assert_eq!(event.data["threshold"], 85.0);
        assert_eq!(event.data["memory_info"]["swap_percent"], 12.5);
        assert_eq!(event.severity, Severity::High);
        assert!(event.tags.contains("alert"));

        // Swap at 12.5 % stays quiet; memory is in cooldown.
        assert!(detector.detect(at()).unwrap().is_none());
    }

    #[test]
    fn swap_reported_after_memory() {
        let mut detector = TriggerDetector::new(Box::new(pinned(97, 93)));
        let first = detector.detect(at()).unwrap().unwrap();
        assert_eq!(first.event_type, "memory.high");
        assert_eq!(first.data["alert_level"], "critical");
        assert_eq!(first.severity, Severity::Critical);

        let second = detector.detect(at()).unwrap().unwrap();
        assert_eq!(second.event_type, "swap.high");
        assert_eq!(second.data["alert_level"], "warning");
        assert_eq!(second.data["threshold"], 90.0);
        assert_eq!(second.severity, Severity::High);
    }

    #[test]
    fn severity_tiers() {
        assert_eq!(severity(MEMORY, 96.0), Severity::Critical);
        assert_eq!(severity(MEMORY, 95.0), Severity::High);
        assert_eq!(severity(MEMORY, 90.0), Severity::Medium);
        assert_eq!(severity(SWAP, 95.5), Severity::Critical);
        assert_eq!(severity(SWAP, 91.0), Severity::High);
    }

    #[test]
    fn critical_must_exceed_both_thresholds() {
        let mut monitor = pinned(10, 10);
        let opts = json!({"swap_threshold": 96, "critical_threshold": 95});
        assert!(monitor.configure(opts.as_object().unwrap()).is_err());
        assert_eq!(monitor.config().swap_threshold, 90.0);
    }

    #[test]
    fn health_metrics_report_current_usage() {
        let metrics = MemoryMonitor::new(Box::new(SimulatedMemory), HostInfo::detect()).health_metrics();
        assert_eq!(metrics["current_memory_percent"], 91.5);
        assert_eq!(metrics["current_swap_percent"], 12.5);
        assert_eq!(metrics["total_memory_gb"], 16.0);
        assert_eq!(metrics["critical_threshold"], 95.0);
    }
}
