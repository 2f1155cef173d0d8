use serde::{Deserialize, Serialize};

/// Retention knobs for the rolling event log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogPolicy {
    /// Entries kept in the log; older ones are trimmed first.
    pub max_log_size: usize,
    /// Session statistics kept by `cleanup_sessions`.
    pub max_sessions: usize,
}

impl Default for LogPolicy {
    fn default() -> Self {
        Self {
            max_log_size: 100,
            max_sessions: 5,
        }
    }
}
