use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use soulrecorder_core_types::SessionId;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::LogPolicy;
use crate::errors::{EsError, EsErrorKind, EsResult};
use crate::model::{EntryFilter, LogEntry};
use crate::ring::RollingBuffer;
use crate::session::{retain_recent, SessionInfo, SessionStats, StatsTable};
use crate::storage::{LogStorage, MemoryStorage};

pub const KEY_EVENT_LOG: &str = "eventLog";
pub const KEY_SESSION_STATS: &str = "sessionStats";
pub const KEY_CURRENT_SESSION: &str = "currentSession";
pub const KEY_SESSION_START: &str = "sessionStartTime";

/// Outcome of an append, reported back to the capture layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AppendAck {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Rolling, session-tagged event log over a key/value backend.
///
/// Every mutation is a read-modify-write of whole storage keys, serialized by
/// an internal lock so concurrent appends never lose entries.
pub struct EventLog {
    storage: Arc<dyn LogStorage>,
    policy: LogPolicy,
    write_lock: Mutex<()>,
}

impl EventLog {
    pub fn new(storage: Arc<dyn LogStorage>, policy: LogPolicy) -> Self {
        Self {
            storage,
            policy,
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), LogPolicy::default())
    }

    pub fn policy(&self) -> &LogPolicy {
        &self.policy
    }

    pub fn storage(&self) -> Arc<dyn LogStorage> {
        self.storage.clone()
    }

    /// Session in effect, created on first use.
    pub async fn current_session(&self) -> EsResult<SessionInfo> {
        let _guard = self.write_lock.lock().await;
        self.current_session_locked().await
    }

    /// Begin a fresh session regardless of the stored one (browser startup).
    pub async fn start_new_session(&self) -> EsResult<SessionInfo> {
        let _guard = self.write_lock.lock().await;
        let session = SessionInfo::fresh(Utc::now());
        self.store_session(&session).await?;
        info!(session = %session.session_id, "started new session");
        Ok(session)
    }

    /// First-install reset: empty log and stats plus a new session.
    pub async fn initialize(&self) -> EsResult<SessionInfo> {
        let _guard = self.write_lock.lock().await;
        let session = SessionInfo::fresh(Utc::now());
        self.storage
            .set_many(vec![
                (KEY_EVENT_LOG.to_string(), Value::Array(Vec::new())),
                (KEY_SESSION_STATS.to_string(), Value::Object(Default::default())),
                (
                    KEY_CURRENT_SESSION.to_string(),
                    Value::String(session.session_id.to_string()),
                ),
                (
                    KEY_SESSION_START.to_string(),
                    Value::String(session.start_time.to_rfc3339()),
                ),
            ])
            .await?;
        info!(session = %session.session_id, "initialized event log");
        Ok(session)
    }

    /// Record one entry; failures are reported in the ack instead of raised.
    pub async fn append(&self, entry: LogEntry) -> AppendAck {
        let kind = entry.kind;
        match self.try_append(entry).await {
            Ok(len) => {
                debug!(kind = kind.as_str(), log_len = len, "appended entry");
                AppendAck::ok()
            }
            Err(err) => {
                warn!(kind = kind.as_str(), error = %err, "append failed");
                AppendAck::failed(err.to_string())
            }
        }
    }

    async fn try_append(&self, mut entry: LogEntry) -> EsResult<usize> {
        let _guard = self.write_lock.lock().await;
        let session = self.current_session_locked().await?;
        entry.session_id = Some(session.session_id.clone());
        entry.session_start_time = Some(session.start_time);

        let mut ring = RollingBuffer::from_entries(self.policy.max_log_size, self.load_log().await?);
        let mut stats = self.load_stats().await?;
        stats
            .entry(session.session_id.clone())
            .or_insert_with(|| SessionStats::opened(session.start_time, entry.timestamp))
            .record(entry.kind, entry.timestamp);
        ring.push(entry);

        let len = ring.len();
        self.storage
            .set_many(vec![
                (KEY_EVENT_LOG.to_string(), to_value(ring.into_vec())?),
                (KEY_SESSION_STATS.to_string(), to_value(&stats)?),
            ])
            .await?;
        Ok(len)
    }

    /// Stored entries, oldest first.
    pub async fn entries(&self) -> EsResult<Vec<LogEntry>> {
        self.load_log().await
    }

    /// Newest `limit` entries passing `filter`, oldest first.
    pub async fn tail(&self, limit: usize, filter: Option<&EntryFilter>) -> EsResult<Vec<LogEntry>> {
        let ring = RollingBuffer::from_entries(self.policy.max_log_size, self.load_log().await?);
        Ok(ring.collect_tail(limit, filter))
    }

    /// Statistics for every retained session.
    pub async fn stats(&self) -> EsResult<StatsTable> {
        self.load_stats().await
    }

    pub async fn session_stats(&self, session: &SessionId) -> EsResult<Option<SessionStats>> {
        Ok(self.load_stats().await?.remove(session))
    }

    /// Drop all entries and statistics; the current session is kept.
    pub async fn clear(&self) -> EsResult<()> {
        let _guard = self.write_lock.lock().await;
        self.storage
            .set_many(vec![
                (KEY_EVENT_LOG.to_string(), Value::Array(Vec::new())),
                (KEY_SESSION_STATS.to_string(), Value::Object(Default::default())),
            ])
            .await?;
        info!("cleared event log");
        Ok(())
    }

    /// Keep statistics of the most recently started sessions only.
    pub async fn cleanup_sessions(&self) -> EsResult<Vec<SessionId>> {
        let _guard = self.write_lock.lock().await;
        let mut stats = self.load_stats().await?;
        let dropped = retain_recent(&mut stats, self.policy.max_sessions);
        if !dropped.is_empty() {
            self.storage
                .set(KEY_SESSION_STATS, to_value(&stats)?)
                .await?;
            info!(dropped = dropped.len(), kept = stats.len(), "cleaned up old sessions");
        }
        Ok(dropped)
    }

    async fn current_session_locked(&self) -> EsResult<SessionInfo> {
        let stored = self
            .storage
            .get(KEY_CURRENT_SESSION)
            .await?
            .and_then(|value| value.as_str().map(SessionId::from))
            .filter(|id| !id.as_str().is_empty());

        let Some(session_id) = stored else {
            let session = SessionInfo::fresh(Utc::now());
            self.store_session(&session).await?;
            debug!(session = %session.session_id, "created session on first use");
            return Ok(session);
        };

        let start_time = self
            .storage
            .get(KEY_SESSION_START)
            .await?
            .and_then(|value| value.as_str().and_then(parse_time))
            .or_else(|| {
                session_id
                    .started_millis()
                    .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            })
            .unwrap_or_else(Utc::now);

        Ok(SessionInfo {
            session_id,
            start_time,
        })
    }

    async fn store_session(&self, session: &SessionInfo) -> EsResult<()> {
        self.storage
            .set_many(vec![
                (
                    KEY_CURRENT_SESSION.to_string(),
                    Value::String(session.session_id.to_string()),
                ),
                (
                    KEY_SESSION_START.to_string(),
                    Value::String(session.start_time.to_rfc3339()),
                ),
            ])
            .await
    }

    async fn load_log(&self) -> EsResult<Vec<LogEntry>> {
        let Some(raw) = self.storage.get(KEY_EVENT_LOG).await? else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = raw else {
            return Err(EsError::new(EsErrorKind::Malformed {
                key: KEY_EVENT_LOG.to_string(),
                reason: "expected an array".to_string(),
            }));
        };
        let mut entries = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<LogEntry>(item) {
                Ok(entry) => entries.push(entry),
                Err(err) => warn!(index, error = %err, "skipping unreadable log entry"),
            }
        }
        Ok(entries)
    }

    async fn load_stats(&self) -> EsResult<StatsTable> {
        load_key(self.storage.as_ref(), KEY_SESSION_STATS)
            .await
            .map(Option::unwrap_or_default)
    }
}

async fn load_key<T: DeserializeOwned>(storage: &dyn LogStorage, key: &str) -> EsResult<Option<T>> {
    match storage.get(key).await? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some).map_err(|err| {
            EsError::new(EsErrorKind::Malformed {
                key: key.to_string(),
                reason: err.to_string(),
            })
        }),
    }
}

fn to_value<T: Serialize>(value: T) -> EsResult<Value> {
    serde_json::to_value(value).map_err(|err| EsError::new(EsErrorKind::Internal(err.to_string())))
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use serde_json::json;
    use soulrecorder_core_types::EventKind;

    use crate::storage::FileStorage;

    fn entry_at(kind: EventKind, second: i64) -> LogEntry {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        LogEntry::new(kind, base + Duration::seconds(second))
    }

    #[tokio::test]
    async fn current_session_is_created_once() {
        let log = EventLog::in_memory();
        let first = log.current_session().await.unwrap();
        let second = log.current_session().await.unwrap();
        assert_eq!(first, second);
        assert!(first.session_id.as_str().starts_with("session_"));
    }

    #[tokio::test]
    async fn start_new_session_replaces_current() {
        let log = EventLog::in_memory();
        let first = log.current_session().await.unwrap();
        let fresh = log.start_new_session().await.unwrap();
        assert_ne!(first.session_id, fresh.session_id);
        assert_eq!(log.current_session().await.unwrap(), fresh);
    }

    #[tokio::test]
    async fn append_enriches_and_counts() {
        let log = EventLog::in_memory();
        let session = log.current_session().await.unwrap();

        assert_eq!(log.append(entry_at(EventKind::Click, 1)).await, AppendAck::ok());
        assert!(log.append(entry_at(EventKind::Click, 2)).await.success);
        assert!(log.append(entry_at(EventKind::Keypress, 3)).await.success);

        let entries = log.entries().await.unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries
            .iter()
            .all(|e| e.session_id.as_ref() == Some(&session.session_id)));
        assert_eq!(entries[0].session_start_time, Some(session.start_time));

        let stats = log.session_stats(&session.session_id).await.unwrap().unwrap();
        assert_eq!(stats.event_count, 3);
        assert_eq!(stats.count_of(EventKind::Click), 2);
        assert_eq!(stats.last_activity, entry_at(EventKind::Keypress, 3).timestamp);
    }

    #[tokio::test]
    async fn log_is_trimmed_to_policy_size() {
        let policy = LogPolicy {
            max_log_size: 3,
            ..LogPolicy::default()
        };
        let log = EventLog::new(Arc::new(MemoryStorage::new()), policy);
        for second in 0..6 {
            log.append(entry_at(EventKind::Focus, second)).await;
        }
        let entries = log.entries().await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].timestamp, entry_at(EventKind::Focus, 3).timestamp);

        let session = log.current_session().await.unwrap();
        let stats = log.session_stats(&session.session_id).await.unwrap().unwrap();
        assert_eq!(stats.event_count, 6);
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let log = Arc::new(EventLog::in_memory());
        let mut handles = Vec::new();
        for second in 0..20 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                log.append(entry_at(EventKind::Click, second)).await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().success);
        }
        assert_eq!(log.entries().await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn initialize_and_clear_reset_state() {
        let log = EventLog::in_memory();
        log.append(entry_at(EventKind::Click, 0)).await;
        let before = log.current_session().await.unwrap();

        log.clear().await.unwrap();
        assert!(log.entries().await.unwrap().is_empty());
        assert!(log.stats().await.unwrap().is_empty());
        assert_eq!(log.current_session().await.unwrap(), before);

        log.append(entry_at(EventKind::Click, 1)).await;
        let after = log.initialize().await.unwrap();
        assert_ne!(after.session_id, before.session_id);
        assert!(log.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cleanup_keeps_most_recent_sessions() {
        let log = EventLog::in_memory();
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let mut table = StatsTable::new();
        for offset in 0..8 {
            let start = base + Duration::hours(offset);
            table.insert(
                SessionId(format!("session_{offset}")),
                SessionStats::opened(start, start),
            );
        }
        log.storage()
            .set(KEY_SESSION_STATS, serde_json::to_value(&table).unwrap())
            .await
            .unwrap();

        let dropped = log.cleanup_sessions().await.unwrap();
        assert_eq!(dropped.len(), 3);
        let kept = log.stats().await.unwrap();
        assert_eq!(kept.len(), 5);
        assert!(kept.contains_key(&SessionId::from("session_7")));
        assert!(!kept.contains_key(&SessionId::from("session_0")));
    }

    #[tokio::test]
    async fn unreadable_entries_are_skipped() {
        let log = EventLog::in_memory();
        log.storage()
            .set(
                KEY_EVENT_LOG,
                json!([
                    {"type": "click", "timestamp": "2024-05-01T09:00:00Z"},
                    {"type": "teleport", "timestamp": "2024-05-01T09:00:01Z"}
                ]),
            )
            .await
            .unwrap();
        let entries = log.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EventKind::Click);
    }

    #[tokio::test]
    async fn stored_session_start_is_reused() {
        let log = EventLog::in_memory();
        log.storage()
            .set_many(vec![
                (KEY_CURRENT_SESSION.to_string(), json!("session_1714554000000_abc")),
                (KEY_SESSION_START.to_string(), json!("2024-05-01T09:00:00.000Z")),
            ])
            .await
            .unwrap();
        let session = log.current_session().await.unwrap();
        assert_eq!(session.session_id.as_str(), "session_1714554000000_abc");
        assert_eq!(
            session.start_time,
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
        );
    }

    struct BrokenStorage;

    #[async_trait]
    impl LogStorage for BrokenStorage {
        async fn get(&self, _key: &str) -> EsResult<Option<Value>> {
            Ok(None)
        }

        async fn set_many(&self, _values: Vec<(String, Value)>) -> EsResult<()> {
            Err(EsError::new(EsErrorKind::StorageWrite("quota exceeded".into())))
        }

        async fn remove(&self, _key: &str) -> EsResult<()> {
            Ok(())
        }

        async fn keys(&self) -> EsResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn storage_failure_is_reported_in_ack() {
        let log = EventLog::new(Arc::new(BrokenStorage), LogPolicy::default());
        let ack = log.append(entry_at(EventKind::Click, 0)).await;
        assert!(!ack.success);
        assert!(ack.error.unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn file_backed_log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let log = EventLog::new(Arc::new(FileStorage::new(dir.path())), LogPolicy::default());
            log.append(entry_at(EventKind::PageLoad, 0)).await;
        }
        let reopened = EventLog::new(Arc::new(FileStorage::new(dir.path())), LogPolicy::default());
        let entries = reopened.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EventKind::PageLoad);
    }

    #[tokio::test]
    async fn failed_stats_write_does_not_persist_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sessionStats.json.tmp")).unwrap();
        let log = EventLog::new(Arc::new(FileStorage::new(dir.path())), LogPolicy::default());

        let ack = log.append(entry_at(EventKind::Click, 0)).await;
        assert!(!ack.success);

        let reopened = EventLog::new(Arc::new(FileStorage::new(dir.path())), LogPolicy::default());
        assert!(reopened.entries().await.unwrap().is_empty());
        assert!(!dir.path().join("eventLog.json").exists());
    }
}
