//! Threshold-based trigger detection.
//!
//! Each poll asks the plugin for its readings, classifies them against the
//! plugin's thresholds and returns the first alert whose key is not inside
//! its cooldown window. At most one event is produced per poll; the rest
//! are picked up by later polls.

pub mod cooldown;
pub mod disk;
pub mod memory;

pub use cooldown::CooldownTable;
pub use disk::DiskSpaceMonitor;
pub use memory::MemoryMonitor;

use crate::host::HostInfo;
use crate::plugin::{PluginDescriptor, TriggerPlugin, PLUGIN_VERSION};
use crate::source::SourceError;
use ap_common::{AlertKey, EventMetadata, TriggerEvent};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// A trigger plugin plus the alert history used to deduplicate its events.
pub struct TriggerDetector {
    plugin: Box<dyn TriggerPlugin>,
    cooldowns: CooldownTable,
}

impl TriggerDetector {
    pub fn new(plugin: Box<dyn TriggerPlugin>) -> Self {
        Self {
            plugin,
            cooldowns: CooldownTable::new(),
        }
    }

    pub fn plugin(&self) -> &dyn TriggerPlugin {
        self.plugin.as_ref()
    }

    pub fn plugin_mut(&mut self) -> &mut dyn TriggerPlugin {
        self.plugin.as_mut()
    }

    pub fn cooldowns(&self) -> &CooldownTable {
        &self.cooldowns
    }

    /// Run one detection pass at `now`.
    ///
    /// Readings are scanned in source order. The first reading that crosses
    /// a threshold and is not suppressed yields the event, and `now` is
    /// recorded for its key.
    pub fn detect(&mut self, now: DateTime<Utc>) -> Result<Option<TriggerEvent>, SourceError> {
        let readings = self.plugin.readings()?;
        let cooldown = self.plugin.cooldown();

        for reading in &readings {
            let Some(level) = reading.thresholds.classify(reading.usage_percent) else {
                continue;
            };
            let key = AlertKey::new(reading.metric.as_str(), level);
            if !self.cooldowns.should_alert(&key, now, cooldown) {
                debug!(%key, usage = reading.usage_percent, "alert suppressed by cooldown");
                continue;
            }

            let event = self.plugin.build_event(reading, level, now);
            info!(
                plugin = self.plugin.descriptor().id,
                event_id = %event.id,
                event_type = %event.event_type,
                usage = reading.usage_percent,
                "trigger fired"
            );
            self.cooldowns.record(key, now);
            return Ok(Some(event));
        }

        debug!(readings = readings.len(), "no trigger condition met");
        Ok(None)
    }
}

/// Event metadata shared by every trigger plugin.
pub(crate) fn event_metadata(descriptor: &PluginDescriptor, host: &HostInfo) -> EventMetadata {
    EventMetadata {
        plugin_id: descriptor.id.to_string(),
        plugin_version: PLUGIN_VERSION.to_string(),
        hostname: host.hostname.clone(),
    }
}
