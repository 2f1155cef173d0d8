use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Shared error type for the recorder crates.
#[derive(Debug, Error, Clone)]
pub enum SoulError {
    #[error("{message}")]
    Message { message: String },
}

impl SoulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

const SESSION_PREFIX: &str = "session_";
const SESSION_SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Identifier of a recording session, `session_<unix millis>_<9 base36 chars>`.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(started: DateTime<Utc>) -> Self {
        Self(format!(
            "{}{}_{}",
            SESSION_PREFIX,
            started.timestamp_millis(),
            random_base36(SESSION_SUFFIX_LEN)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Millisecond timestamp embedded in generated ids.
    pub fn started_millis(&self) -> Option<i64> {
        self.0
            .strip_prefix(SESSION_PREFIX)?
            .split('_')
            .next()?
            .parse()
            .ok()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

fn random_base36(len: usize) -> String {
    let mut seed = Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        out.push(BASE36[(seed % 36) as usize] as char);
        seed /= 36;
    }
    out
}

/// Interaction kinds produced by the capture layer.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Click,
    Keypress,
    FormSubmit,
    Focus,
    ScrollStart,
    Scroll,
    Navigation,
    PageLoad,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Keypress => "keypress",
            EventKind::FormSubmit => "form_submit",
            EventKind::Focus => "focus",
            EventKind::ScrollStart => "scroll_start",
            EventKind::Scroll => "scroll",
            EventKind::Navigation => "navigation",
            EventKind::PageLoad => "page_load",
        }
    }

    pub fn all() -> [EventKind; 8] {
        [
            EventKind::Click,
            EventKind::Keypress,
            EventKind::FormSubmit,
            EventKind::Focus,
            EventKind::ScrollStart,
            EventKind::Scroll,
            EventKind::Navigation,
            EventKind::PageLoad,
        ]
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::all().into_iter().find(|kind| kind.as_str() == raw)
    }

    /// Whether entries of this kind carry a target element.
    pub fn has_target(&self) -> bool {
        matches!(
            self,
            EventKind::Click | EventKind::Keypress | EventKind::FormSubmit | EventKind::Focus
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
