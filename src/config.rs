//! Application configuration
//!
//! Loaded from YAML; every section falls back to defaults when omitted.

use std::path::PathBuf;

use selector_synth::SynthOptions;
use serde::{Deserialize, Serialize};
use soulrecorder_event_store::LogPolicy;
use soulrecorder_recorder::RecorderOptions;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub output_dir: PathBuf,
    pub storage: StorageConfig,
    pub recorder: RecorderConfig,
    pub selector: SynthOptions,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// State directory, `<output_dir>/state` when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RecorderConfig {
    pub max_log_size: usize,
    pub max_sessions: usize,
    pub scroll_idle_ms: u64,
    pub text_max_len: usize,
    pub sensitive_fields: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./soulrecorder-output"),
            storage: StorageConfig::default(),
            recorder: RecorderConfig::default(),
            selector: SynthOptions::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: None,
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        let policy = LogPolicy::default();
        let options = RecorderOptions::default();
        Self {
            max_log_size: policy.max_log_size,
            max_sessions: policy.max_sessions,
            scroll_idle_ms: options.scroll_idle_ms,
            text_max_len: options.text_max_len,
            sensitive_fields: options.sensitive_fields,
        }
    }
}

impl Config {
    pub fn state_dir(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| self.output_dir.join("state"))
    }

    pub fn log_policy(&self) -> LogPolicy {
        LogPolicy {
            max_log_size: self.recorder.max_log_size,
            max_sessions: self.recorder.max_sessions,
        }
    }

    pub fn recorder_options(&self) -> RecorderOptions {
        RecorderOptions {
            scroll_idle_ms: self.recorder.scroll_idle_ms,
            text_max_len: self.recorder.text_max_len,
            sensitive_fields: self.recorder.sensitive_fields.clone(),
            selector: self.selector.clone(),
        }
    }

    /// Semantic checks beyond what deserialization enforces
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.recorder.max_log_size == 0 {
            problems.push("recorder.max_log_size must be at least 1".to_string());
        }
        if self.recorder.max_sessions == 0 {
            problems.push("recorder.max_sessions must be at least 1".to_string());
        }
        if self.selector.max_depth == 0 {
            problems.push("selector.max_depth must be at least 1".to_string());
        }
        if self.recorder.sensitive_fields.iter().any(|f| f.trim().is_empty()) {
            problems.push("recorder.sensitive_fields must not contain empty entries".to_string());
        }
        problems
    }
}
