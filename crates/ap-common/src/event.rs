//! Trigger events emitted by monitoring plugins.

use crate::id::EventId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Alert level reached by a sub-metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Warning,
    Critical,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Warning => write!(f, "warning"),
            AlertLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Event severity as seen by the host agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

/// Metadata attached to every trigger event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub plugin_id: String,
    pub plugin_version: String,
    pub hostname: String,
}

/// A single trigger event. Produced per detection poll, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub id: EventId,
    /// Dotted taxonomy, e.g. `disk.space.critical`.
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
    pub metadata: EventMetadata,
    pub tags: BTreeSet<String>,
    pub severity: Severity,
}

/// Collect tags into the event's tag set.
pub fn tag_set<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tags.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_alert_level_ordering() {
        assert!(AlertLevel::Critical > AlertLevel::Warning);
    }

    #[test]
    fn test_severity_serde() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            r#""critical""#
        );
        assert_eq!(serde_json::to_string(&Severity::Medium).unwrap(), r#""medium""#);
    }

    #[test]
    fn test_event_serializes_type_field() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        let event = TriggerEvent {
            id: EventId::new("disk", &["critical", "/"], at),
            event_type: "disk.space.critical".to_string(),
            source: "disk-space-monitor".to_string(),
            timestamp: at,
            data: serde_json::json!({"alert_level": "critical"}),
            metadata: EventMetadata {
                plugin_id: "disk-space-monitor".to_string(),
                plugin_version: "1.0.0".to_string(),
                hostname: "host-1".to_string(),
            },
            tags: tag_set(["system", "disk", "critical", "disk"]),
            severity: Severity::Critical,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "disk.space.critical");
        assert_eq!(json["severity"], "critical");
        assert_eq!(json["tags"].as_array().unwrap().len(), 3);
        assert!(json.get("event_type").is_none());
    }
}
