//! Disk space monitor.

use super::event_metadata;
use crate::host::HostInfo;
use crate::plugin::{
    MetricSnapshot, PluginCore, PluginDescriptor, Reading, Thresholds, TriggerPlugin,
};
use crate::source::{DiskSource, FilesystemUsage, SourceError};
use ap_common::{tag_set, AlertLevel, ConfigSchema, EventId, PluginKind, Severity, TriggerEvent};
use ap_config::{ConfigError, ConfigMap, DiskMonitorConfig};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

pub static DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    id: "disk-space-monitor",
    name: "Disk Space Monitor",
    description: "Monitors disk usage across filesystems with configurable thresholds",
    kind: PluginKind::Trigger,
    tags: &["system", "monitoring", "disk", "storage", "filesystem"],
    categories: &["system-monitoring"],
};

pub struct DiskSpaceMonitor {
    config: DiskMonitorConfig,
    source: Box<dyn DiskSource>,
    host: HostInfo,
}

impl DiskSpaceMonitor {
    pub fn new(source: Box<dyn DiskSource>, host: HostInfo) -> Self {
        Self {
            config: DiskMonitorConfig::default(),
            source,
            host,
        }
    }

    pub fn config(&self) -> &DiskMonitorConfig {
        &self.config
    }

    /// Filesystems that pass the path and type filters, in source order.
    pub fn monitored(&self) -> Result<Vec<FilesystemUsage>, SourceError> {
        let mut filesystems = self.source.filesystems()?;
        filesystems.retain(|fs| self.config.watches(&fs.mountpoint, &fs.fstype));
        Ok(filesystems)
    }

    fn thresholds(&self) -> Thresholds {
        Thresholds {
            warning: self.config.threshold,
            critical: self.config.critical_threshold,
        }
    }
}

impl PluginCore for DiskSpaceMonitor {
    fn descriptor(&self) -> &'static PluginDescriptor {
        &DESCRIPTOR
    }

    fn configure(&mut self, options: &ConfigMap) -> Result<(), ConfigError> {
        self.config = DiskMonitorConfig::from_options(options)?;
        Ok(())
    }

    fn health_metrics(&self) -> Value {
        let mut metrics = json!({
            "threshold": self.config.threshold,
            "critical_threshold": self.config.critical_threshold,
        });
        match self.monitored() {
            Ok(filesystems) => {
                let highest = filesystems.iter().map(|fs| fs.percent).fold(0.0, f64::max);
                metrics["monitored_filesystems"] = json!(filesystems.len());
                metrics["highest_usage"] = json!(highest);
                metrics["filesystems"] = json!(filesystems);
            }
            Err(err) => {
                warn!(error = %err, "disk health probe failed");
                metrics["monitored_filesystems"] = json!(0);
                metrics["error"] = json!(err.to_string());
            }
        }
        metrics
    }
}

impl TriggerPlugin for DiskSpaceMonitor {
    fn trigger_schema(&self) -> ConfigSchema {
        DiskMonitorConfig::schema()
    }

    fn readings(&self) -> Result<Vec<Reading>, SourceError> {
        let thresholds = self.thresholds();
        Ok(self
            .monitored()?
            .into_iter()
            .map(|fs| Reading {
                metric: fs.mountpoint.clone(),
                usage_percent: fs.percent,
                thresholds,
                snapshot: MetricSnapshot::Filesystem(fs),
            })
            .collect())
    }

    fn cooldown(&self) -> Duration {
        self.config.cooldown()
    }

    fn build_event(&self, reading: &Reading, level: AlertLevel, at: DateTime<Utc>) -> TriggerEvent {
        let level_name = level.to_string();
        let (filesystem, free_gb) = match &reading.snapshot {
            MetricSnapshot::Filesystem(fs) => (json!(fs), fs.free_gb),
            MetricSnapshot::Memory(_) => (Value::Null, 0.0),
        };

        TriggerEvent {
            id: EventId::new("disk", &[level_name.as_str(), reading.metric.as_str()], at),
            event_type: format!("disk.space.{level_name}"),
            source: DESCRIPTOR.id.to_string(),
            timestamp: at,
            data: json!({
                "alert_level": level,
                "filesystem": filesystem,
                "threshold": reading.thresholds.for_level(level),
                "usage_percent": reading.usage_percent,
                "free_space_gb": free_gb,
                "system_info": {
                    "hostname": self.host.hostname,
                    "platform": self.host.platform,
                },
            }),
            metadata: event_metadata(&DESCRIPTOR, &self.host),
            tags: tag_set(["system", "disk", "storage", "filesystem", level_name.as_str()]),
            severity: match level {
                AlertLevel::Critical => Severity::Critical,
                AlertLevel::Warning => Severity::High,
            },
        }
    }
}
