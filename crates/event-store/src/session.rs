use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soulrecorder_core_types::{EventKind, SessionId};

/// The session entries are currently attributed to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub start_time: DateTime<Utc>,
}

impl SessionInfo {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            session_id: SessionId::at(now),
            start_time: now,
        }
    }
}

/// Per-session activity counters, stored under `sessionStats` keyed by id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub start_time: DateTime<Utc>,
    pub event_count: u64,
    #[serde(default)]
    pub event_types: BTreeMap<String, u64>,
    pub last_activity: DateTime<Utc>,
}

impl SessionStats {
    pub fn opened(start_time: DateTime<Utc>, first_activity: DateTime<Utc>) -> Self {
        Self {
            start_time,
            event_count: 0,
            event_types: BTreeMap::new(),
            last_activity: first_activity,
        }
    }

    pub fn record(&mut self, kind: EventKind, at: DateTime<Utc>) {
        self.event_count += 1;
        self.last_activity = at;
        *self
            .event_types
            .entry(kind.as_str().to_string())
            .or_insert(0) += 1;
    }

    pub fn count_of(&self, kind: EventKind) -> u64 {
        self.event_types.get(kind.as_str()).copied().unwrap_or(0)
    }
}

pub type StatsTable = BTreeMap<SessionId, SessionStats>;

/// Keep the `keep` sessions with the most recent start time.
///
/// Returns the ids that were dropped, oldest last.
pub fn retain_recent(table: &mut StatsTable, keep: usize) -> Vec<SessionId> {
    if table.len() <= keep {
        return Vec::new();
    }
    let mut ordered: Vec<(SessionId, DateTime<Utc>)> = table
        .iter()
        .map(|(id, stats)| (id.clone(), stats.start_time))
        .collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1));

    let dropped: Vec<SessionId> = ordered.into_iter().skip(keep).map(|(id, _)| id).collect();
    for id in &dropped {
        table.remove(id);
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn record_counts_per_kind() {
        let mut stats = SessionStats::opened(base(), base());
        stats.record(EventKind::Click, base() + Duration::seconds(1));
        stats.record(EventKind::Click, base() + Duration::seconds(2));
        stats.record(EventKind::Keypress, base() + Duration::seconds(3));

        assert_eq!(stats.event_count, 3);
        assert_eq!(stats.count_of(EventKind::Click), 2);
        assert_eq!(stats.count_of(EventKind::Scroll), 0);
        assert_eq!(stats.last_activity, base() + Duration::seconds(3));
    }

    #[test]
    fn retain_recent_keeps_newest_by_start_time() {
        let mut table = StatsTable::new();
        for offset in 0..7 {
            let start = base() + Duration::hours(offset);
            table.insert(
                SessionId(format!("s{offset}")),
                SessionStats::opened(start, start),
            );
        }

        let dropped = retain_recent(&mut table, 5);
        assert_eq!(dropped, vec![SessionId::from("s1"), SessionId::from("s0")]);
        assert_eq!(table.len(), 5);
        assert!(table.contains_key(&SessionId::from("s6")));
    }

    #[test]
    fn retain_recent_is_noop_under_limit() {
        let mut table = StatsTable::new();
        table.insert(SessionId::from("a"), SessionStats::opened(base(), base()));
        assert!(retain_recent(&mut table, 5).is_empty());
        assert_eq!(table.len(), 1);
    }
}
