//! Capture layer
//!
//! A [`Recorder`] watches one page through the [`PageHost`] trait and turns
//! clicks, keystrokes, form submissions, focus changes, scroll bursts,
//! navigations and page loads into [`LogEntry`] values ready for the event
//! log. [`StaticPage`] hosts a parsed HTML document for offline sessions.
//!
//! [`LogEntry`]: soulrecorder_event_store::LogEntry

pub mod context;
pub mod errors;
pub mod forms;
pub mod host;
pub mod recorder;
pub mod static_page;
pub mod trackers;

pub use context::{domain_of, element_context, event_context};
pub use errors::{RecorderError, RecorderResult};
pub use forms::{FieldMask, FieldValue, FormField};
pub use host::{Clock, ElementFacts, ManualClock, NodeOf, PageHost, Rect, SystemClock};
pub use recorder::{KeyInfo, Recorder, RecorderOptions};
pub use static_page::StaticPage;
pub use trackers::{FocusTracker, NavigationTracker, ScrollTracker};
