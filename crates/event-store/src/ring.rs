use std::collections::VecDeque;

use crate::model::{EntryFilter, LogEntry};

/// Bounded log that drops its oldest entry once full.
#[derive(Clone, Debug, Default)]
pub struct RollingBuffer {
    capacity: usize,
    queue: VecDeque<LogEntry>,
}

impl RollingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: VecDeque::with_capacity(capacity),
        }
    }

    /// Wrap a stored log, keeping only the newest `capacity` entries.
    pub fn from_entries(capacity: usize, entries: Vec<LogEntry>) -> Self {
        let mut ring = Self {
            capacity,
            queue: VecDeque::from(entries),
        };
        ring.trim();
        ring
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.capacity > 0 && self.queue.len() >= self.capacity {
            self.queue.pop_front();
        }
        self.queue.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.queue.iter().cloned().collect()
    }

    pub fn into_vec(self) -> Vec<LogEntry> {
        self.queue.into()
    }

    /// Newest `limit` matching entries, oldest first.
    pub fn collect_tail(&self, limit: usize, filter: Option<&EntryFilter>) -> Vec<LogEntry> {
        let mut out = Vec::new();
        if limit == 0 {
            return out;
        }
        for entry in self.queue.iter().rev() {
            if filter.map(|f| f.matches(entry)).unwrap_or(true) {
                out.push(entry.clone());
                if out.len() == limit {
                    break;
                }
            }
        }
        out.reverse();
        out
    }

    fn trim(&mut self) {
        if self.capacity == 0 {
            return;
        }
        while self.queue.len() > self.capacity {
            self.queue.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use soulrecorder_core_types::EventKind;

    fn entry(kind: EventKind, second: i64) -> LogEntry {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        LogEntry::new(kind, base + Duration::seconds(second))
    }

    #[test]
    fn push_drops_oldest_at_capacity() {
        let mut ring = RollingBuffer::new(3);
        for second in 0..5 {
            ring.push(entry(EventKind::Click, second));
        }
        let kept: Vec<_> = ring.snapshot().iter().map(|e| e.timestamp).collect();
        let expected: Vec<_> = (2..5)
            .map(|second| entry(EventKind::Click, second).timestamp)
            .collect();
        assert_eq!(ring.len(), 3);
        assert_eq!(kept, expected);
    }

    #[test]
    fn from_entries_trims_front() {
        let stored = (0..10).map(|s| entry(EventKind::Focus, s)).collect();
        let ring = RollingBuffer::from_entries(4, stored);
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.snapshot()[0].timestamp, entry(EventKind::Focus, 6).timestamp);
    }

    #[test]
    fn collect_tail_filters_and_keeps_order() {
        let mut ring = RollingBuffer::new(10);
        ring.push(entry(EventKind::Click, 0));
        ring.push(entry(EventKind::Keypress, 1));
        ring.push(entry(EventKind::Click, 2));
        ring.push(entry(EventKind::Click, 3));

        let filter = EntryFilter::kinds(vec![EventKind::Click]);
        let tail = ring.collect_tail(2, Some(&filter));
        assert_eq!(tail.len(), 2);
        assert!(tail[0].timestamp < tail[1].timestamp);
        assert_eq!(tail[1].timestamp, entry(EventKind::Click, 3).timestamp);
        assert!(ring.collect_tail(0, None).is_empty());
    }
}
