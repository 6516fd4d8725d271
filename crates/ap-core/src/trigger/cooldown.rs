//! Alert deduplication.

use ap_common::AlertKey;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Last alert time per key. Lives as long as the process; entries are
/// overwritten, never evicted.
#[derive(Debug, Default, Clone)]
pub struct CooldownTable {
    last_alert: HashMap<AlertKey, DateTime<Utc>>,
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `key` never fired or its last alert is at least `cooldown`
    /// before `now`. A clock that moved backwards keeps the key suppressed.
    pub fn should_alert(&self, key: &AlertKey, now: DateTime<Utc>, cooldown: Duration) -> bool {
        match self.last_alert.get(key) {
            None => true,
            Some(last) => now
                .signed_duration_since(*last)
                .to_std()
                .map_or(false, |elapsed| elapsed >= cooldown),
        }
    }

    pub fn record(&mut self, key: AlertKey, at: DateTime<Utc>) {
        self.last_alert.insert(key, at);
    }

    pub fn last_alert(&self, key: &AlertKey) -> Option<DateTime<Utc>> {
        self.last_alert.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.last_alert.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_alert.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_common::AlertLevel;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn unseen_key_alerts() {
        let table = CooldownTable::new();
        let key = AlertKey::new("/", AlertLevel::Critical);
        assert!(table.should_alert(&key, t(0), Duration::from_secs(600)));
    }

    #[test]
    fn suppressed_until_cooldown_elapses() {
        let mut table = CooldownTable::new();
        let key = AlertKey::new("/", AlertLevel::Critical);
        table.record(key.clone(), t(0));
        let cooldown = Duration::from_secs(600);
        assert!(!table.should_alert(&key, t(599), cooldown));
        assert!(table.should_alert(&key, t(600), cooldown));
    }

    #[test]
    fn keys_are_independent() {
        let mut table = CooldownTable::new();
        table.record(AlertKey::new("/", AlertLevel::Critical), t(0));
        let cooldown = Duration::from_secs(600);
        assert!(table.should_alert(&AlertKey::new("/", AlertLevel::Warning), t(1), cooldown));
        assert!(table.should_alert(&AlertKey::new("/home", AlertLevel::Critical), t(1), cooldown));
    }

    #[test]
    fn zero_cooldown_never_suppresses() {
        let mut table = CooldownTable::new();
        let key = AlertKey::new("swap", AlertLevel::Warning);
        table.record(key.clone(), t(0));
        assert!(table.should_alert(&key, t(0), Duration::ZERO));
    }

    #[test]
    fn backwards_clock_keeps_suppression() {
        let mut table = CooldownTable::new();
        let key = AlertKey::new("memory", AlertLevel::Warning);
        table.record(key.clone(), t(100));
        assert!(!table.should_alert(&key, t(50), Duration::from_secs(10)));
    }

    #[test]
    fn record_overwrites() {
        let mut table = CooldownTable::new();
        let key = AlertKey::new("/var", AlertLevel::Warning);
        table.record(key.clone(), t(0));
        table.record(key.clone(), t(700));
        assert_eq!(table.len(), 1);
        assert_eq!(table.last_alert(&key), Some(t(700)));
    }
}
