//! Bounded, timestamped event log.

use core::time::Duration;
use std::collections::VecDeque;

use serde::Serialize;

use super::events::{EngineEvent, Severity};

/// One logged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Time since the engine's clock epoch.
    pub at: Duration,
    /// Presentation severity.
    pub severity: Severity,
    /// The event.
    pub event: EngineEvent,
}

/// Ring buffer of the most recent events. Oldest entries are evicted once
/// the capacity is reached.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    evicted: u64,
}

impl EventLog {
    /// Creates an empty log. A capacity of zero disables logging.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            evicted: 0,
        }
    }

    /// Appends an event stamped with `at`.
    pub fn push(&mut self, at: Duration, event: EngineEvent) {
        if self.capacity == 0 {
            self.evicted += 1;
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }
        self.entries.push_back(LogEntry {
            at,
            severity: event.severity(),
            event,
        });
    }

    /// Iterates entries from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogEntry> + '_ {
        self.entries.iter()
    }

    /// Returns the newest entry.
    #[must_use]
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// Returns the number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entry is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum number of retained entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns how many entries have been dropped to respect the capacity.
    #[must_use]
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Drops every entry and resets the eviction count.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.evicted = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_model::ProcessId;

    fn completed(id: u64) -> EngineEvent {
        EngineEvent::ProcessCompleted {
            process: ProcessId::new(id),
        }
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let mut log = EventLog::with_capacity(2);
        for id in 1..=3 {
            log.push(Duration::from_millis(id), completed(id));
        }

        let kept: Vec<_> = log.iter().map(|e| e.event.clone()).collect();
        assert_eq!(kept, vec![completed(2), completed(3)]);
        assert_eq!(log.evicted(), 1);
        assert_eq!(log.latest().unwrap().at, Duration::from_millis(3));
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut log = EventLog::with_capacity(0);
        log.push(Duration::ZERO, EngineEvent::Reset);
        assert!(log.is_empty());
        assert_eq!(log.evicted(), 1);
    }
}
