use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use selector_synth::{SelectorSynthesizer, SynthOptions};
use serde::{Deserialize, Serialize};
use soulrecorder_core_types::EventKind;
use soulrecorder_event_store::{LogEntry, Modifiers, MouseInfo};
use tracing::{debug, trace};

use crate::context::{element_context, event_context};
use crate::forms::{FieldMask, FormField};
use crate::host::{Clock, NodeOf, PageHost, SystemClock};
use crate::trackers::{FocusTracker, NavigationTracker, ScrollTracker};

/// Capture tunables
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderOptions {
    /// Idle time that closes a scroll burst
    pub scroll_idle_ms: u64,
    /// Characters of element text and form values kept
    pub text_max_len: usize,
    /// Form field name fragments whose values are masked
    pub sensitive_fields: Vec<String>,
    pub selector: SynthOptions,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            scroll_idle_ms: 150,
            text_max_len: 100,
            sensitive_fields: vec!["password".into(), "ssn".into(), "credit".into()],
            selector: SynthOptions::default(),
        }
    }
}

/// Key event details
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    pub key: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub key_code: u32,
    #[serde(flatten)]
    pub modifiers: Modifiers,
}

impl KeyInfo {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }
}

/// Capture layer for one page.
///
/// Focus, scroll and navigation state lives on the instance; two recorders
/// never share it.
pub struct Recorder<H: PageHost> {
    host: H,
    options: RecorderOptions,
    clock: Arc<dyn Clock>,
    focus: FocusTracker<NodeOf<H>>,
    scroll: ScrollTracker,
    navigation: NavigationTracker,
}

impl<H: PageHost> Recorder<H> {
    pub fn new(host: H, options: RecorderOptions) -> Self {
        Self::with_clock(host, options, Arc::new(SystemClock))
    }

    pub fn with_clock(host: H, options: RecorderOptions, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        let scroll = ScrollTracker::new(
            i64::try_from(options.scroll_idle_ms)
                .ok()
                .and_then(Duration::try_milliseconds)
                .unwrap_or(Duration::MAX),
            host.scroll_position(),
            now,
        );
        let navigation = NavigationTracker::new(host.url());
        Self {
            host,
            options,
            clock,
            focus: FocusTracker::default(),
            scroll,
            navigation,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn options(&self) -> &RecorderOptions {
        &self.options
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Selector for `node` in the current document state
    pub fn selector_for(&self, node: &NodeOf<H>) -> String {
        SelectorSynthesizer::with_options(self.host.document(), self.options.selector.clone())
            .synthesize(Some(node))
    }

    pub fn on_click(&mut self, target: &NodeOf<H>, mouse: MouseInfo) -> LogEntry {
        let mut entry = self.targeted(EventKind::Click, target);
        entry.mouse = Some(mouse);
        entry
    }

    /// Keypress entry, only for text-accepting targets
    pub fn on_keydown(&mut self, target: &NodeOf<H>, key: KeyInfo) -> Option<LogEntry> {
        if !self.host.inspect(target).accepts_text() {
            trace!(key = %key.key, "ignoring keydown outside an editable element");
            return None;
        }
        let mut entry = self.targeted(EventKind::Keypress, target);
        entry.key = Some(key.key);
        entry.code = Some(key.code);
        entry.key_code = Some(key.key_code);
        entry.modifiers = Some(key.modifiers);
        Some(entry)
    }

    pub fn on_submit(&mut self, form: &NodeOf<H>, fields: &[FormField]) -> LogEntry {
        let mask = FieldMask {
            sensitive: &self.options.sensitive_fields,
            max_len: self.options.text_max_len,
        };
        let form_data = mask.apply(fields);
        let mut entry = self.targeted(EventKind::FormSubmit, form);
        entry.form_data = Some(form_data);
        entry
    }

    /// Focus entry unless `target` already holds focus
    pub fn on_focus_in(&mut self, target: &NodeOf<H>) -> Option<LogEntry> {
        if !self.focus.observe(target) {
            return None;
        }
        Some(self.targeted(EventKind::Focus, target))
    }

    /// Feed a scroll event at `now`; returns `scroll_start` for a new burst
    pub fn on_scroll(&mut self, now: DateTime<Utc>) -> Option<LogEntry> {
        let started = self.scroll.on_scroll(self.host.scroll_position(), now)?;
        let mut entry = self.page_entry(EventKind::ScrollStart, now);
        entry.scroll = Some(started);
        Some(entry)
    }

    /// Scroll summary once the burst has been idle long enough
    pub fn poll_scroll_end(&mut self, now: DateTime<Utc>) -> Option<LogEntry> {
        let summary = self.scroll.poll_end(now)?;
        let mut entry = self.page_entry(EventKind::Scroll, now);
        entry.viewport = Some(self.host.viewport());
        entry.scroll = Some(summary);
        debug!(
            direction = summary.direction.map(|d| d.as_str()).unwrap_or("none"),
            distance = summary.distance.unwrap_or_default(),
            "scroll burst ended"
        );
        Some(entry)
    }

    /// Navigation entry when the URL changed since the last check
    pub fn check_navigation(&mut self) -> Option<LogEntry> {
        let (from, to) = self.navigation.check(&self.host.url())?;
        debug!(%from, %to, "navigation detected");
        let mut entry = self.page_entry(EventKind::Navigation, self.clock.now());
        entry.from = Some(from);
        entry.to = Some(to);
        Some(entry)
    }

    pub fn page_load(&mut self) -> LogEntry {
        self.page_entry(EventKind::PageLoad, self.clock.now())
    }

    fn targeted(&self, kind: EventKind, target: &NodeOf<H>) -> LogEntry {
        let facts = self.host.inspect(target);
        let mut entry = self.page_entry(kind, self.clock.now());
        entry.selector = Some(self.selector_for(target));
        entry.element = Some(element_context(
            &facts,
            self.host.scroll_position(),
            self.host.viewport(),
            self.options.text_max_len,
        ));
        entry
    }

    fn page_entry(&self, kind: EventKind, at: DateTime<Utc>) -> LogEntry {
        let mut entry = LogEntry::new(kind, at);
        entry.context = Some(event_context(&self.host, &self.options.selector));
        entry
    }
}
