//! Host capabilities the recorder reads from

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use selector_synth::DomDocument;
use soulrecorder_event_store::{ScrollPosition, Viewport};

/// Node handle type of a host's document
pub type NodeOf<H> = <<H as PageHost>::Doc as DomDocument>::Node;

/// Viewport-relative bounding box, in CSS pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Raw element properties as the host reports them
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementFacts {
    /// Tag as reported by the host, any case
    pub tag_name: String,
    pub text_content: String,
    pub value: Option<String>,
    pub placeholder: Option<String>,
    pub input_type: Option<String>,
    pub rect: Rect,
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub name: Option<String>,
    pub content_editable: bool,
}

impl ElementFacts {
    /// Whether keystrokes on this element are worth recording
    pub fn accepts_text(&self) -> bool {
        self.content_editable
            || ["INPUT", "TEXTAREA", "SELECT"]
                .iter()
                .any(|tag| self.tag_name.eq_ignore_ascii_case(tag))
    }
}

/// A page the recorder observes
pub trait PageHost {
    type Doc: DomDocument;

    fn document(&self) -> &Self::Doc;
    fn viewport(&self) -> Viewport;
    fn scroll_position(&self) -> ScrollPosition;
    fn title(&self) -> String;
    fn url(&self) -> String;
    fn active_element(&self) -> Option<NodeOf<Self>>;
    fn inspect(&self, node: &NodeOf<Self>) -> ElementFacts;
}

/// Source of entry timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to, for scripted sessions
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = at;
        }
    }

    /// Move forward by `by`; `None` leaves the clock where it was when the
    /// result would fall outside the representable range.
    pub fn advance(&self, by: Duration) -> Option<DateTime<Utc>> {
        let mut now = match self.now.lock() {
            Ok(now) => now,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = now.checked_add_signed(by)?;
        *now = next;
        Some(next)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn text_targets() {
        let facts = |tag: &str, editable| ElementFacts {
            tag_name: tag.into(),
            content_editable: editable,
            ..Default::default()
        };
        assert!(facts("INPUT", false).accepts_text());
        assert!(facts("textarea", false).accepts_text());
        assert!(facts("div", true).accepts_text());
        assert!(!facts("BUTTON", false).accepts_text());
    }

    #[test]
    fn manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);
        let later = clock.advance(Duration::milliseconds(250)).unwrap();
        assert_eq!(later, start + Duration::milliseconds(250));
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn manual_clock_refuses_to_leave_the_calendar() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.advance(Duration::MAX), None);
        assert_eq!(clock.now(), start);
    }
}
