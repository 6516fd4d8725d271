//! Event and alert identity types.

use crate::event::AlertLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trigger event identifier.
///
/// Format: `<prefix>-<part>-<part>...-<unix_seconds>`
/// Example: `disk-critical-_var-1736942400`
///
/// Slashes in parts are replaced by underscores so mount points stay
/// readable without introducing path separators into the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    /// Build an event id from a prefix, identifying parts and the event time.
    pub fn new(prefix: &str, parts: &[&str], at: DateTime<Utc>) -> Self {
        let mut id = String::from(prefix);
        for part in parts {
            id.push('-');
            id.push_str(&part.replace('/', "_"));
        }
        id.push('-');
        id.push_str(&at.timestamp().to_string());
        EventId(id)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cooldown key: a monitored sub-metric paired with its alert level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertKey {
    pub metric: String,
    pub level: AlertLevel,
}

impl AlertKey {
    pub fn new(metric: impl Into<String>, level: AlertLevel) -> Self {
        AlertKey {
            metric: metric.into(),
            level,
        }
    }
}

impl fmt::Display for AlertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.metric, self.level)
    }
}
