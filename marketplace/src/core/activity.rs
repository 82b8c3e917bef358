//! Bounded recent-activity feed, newest first

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use shared::{ActivityEntry, ActivityKind};

pub const DEFAULT_ACTIVITY_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct ActivityLog {
    capacity: usize,
    entries: VecDeque<ActivityEntry>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_CAPACITY)
    }
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Restore persisted entries, keeping the newest `capacity` of them
    pub fn from_entries(entries: Vec<ActivityEntry>, capacity: usize) -> Self {
        let mut entries: VecDeque<ActivityEntry> = entries.into();
        entries.truncate(capacity);
        Self { capacity, entries }
    }

    pub fn record(&mut self, kind: ActivityKind, message: impl Into<String>, at: DateTime<Utc>) {
        if self.capacity == 0 {
            return;
        }
        self.entries.push_front(ActivityEntry {
            at,
            kind,
            message: message.into(),
        });
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<ActivityEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_entry_comes_first_and_old_ones_fall_off() {
        let mut log = ActivityLog::new(2);
        let now = Utc::now();
        log.record(ActivityKind::Login, "one", now);
        log.record(ActivityKind::OrderPlaced, "two", now);
        log.record(ActivityKind::OrderReady, "three", now);

        let messages: Vec<_> = log.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["three", "two"]);
    }

    #[test]
    fn restoring_truncates_to_capacity() {
        let now = Utc::now();
        let entries = (0..5)
            .map(|i| ActivityEntry { at: now, kind: ActivityKind::Login, message: i.to_string() })
            .collect();
        let log = ActivityLog::from_entries(entries, 3);
        assert_eq!(log.len(), 3);
        assert_eq!(log.entries().next().unwrap().message, "0");
    }
}
