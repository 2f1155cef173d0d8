use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soulrecorder_core_types::{EventKind, SessionId};

/// Keyboard modifier state at the time of an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Modifiers {
    pub ctrl_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
    pub meta_key: bool,
}

impl Modifiers {
    /// Pressed modifiers in `Ctrl`, `Shift`, `Alt`, `Meta` order.
    pub fn labels(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.ctrl_key {
            out.push("Ctrl");
        }
        if self.shift_key {
            out.push("Shift");
        }
        if self.alt_key {
            out.push("Alt");
        }
        if self.meta_key {
            out.push("Meta");
        }
        out
    }

    pub fn any(&self) -> bool {
        self.ctrl_key || self.shift_key || self.alt_key || self.meta_key
    }
}

/// Pointer details of a click.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MouseInfo {
    pub x: f64,
    pub y: f64,
    /// 0 = left, 1 = middle, 2 = right
    #[serde(default)]
    pub button: u8,
    #[serde(flatten)]
    pub modifiers: Modifiers,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementAttributes {
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub name: Option<String>,
}

/// Snapshot of the element an event targeted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementContext {
    pub tag_name: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(rename = "type", default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub attributes: ElementAttributes,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub title: String,
    pub url: String,
    pub domain: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveElement {
    pub tag_name: String,
    pub selector: String,
}

/// Page-level context captured with every entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    pub viewport: Viewport,
    pub scroll: ScrollPosition,
    pub page: PageInfo,
    #[serde(default)]
    pub active_element: Option<ActiveElement>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
    #[default]
    None,
}

impl ScrollDirection {
    /// Dominant direction of a displacement; vertical wins ties against zero.
    pub fn from_delta(dx: f64, dy: f64) -> Self {
        if dy.abs() > dx.abs() {
            if dy > 0.0 {
                ScrollDirection::Down
            } else {
                ScrollDirection::Up
            }
        } else if dx.abs() > 0.0 {
            if dx > 0.0 {
                ScrollDirection::Right
            } else {
                ScrollDirection::Left
            }
        } else {
            ScrollDirection::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
            ScrollDirection::None => "none",
        }
    }
}

/// Scroll burst details; summary fields are only set on `scroll` entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollInfo {
    pub x: f64,
    pub y: f64,
    pub start_x: f64,
    pub start_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<ScrollDirection>,
    /// Pixels per second of the last scroll step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<i64>,
    /// Milliseconds from the first to the last scroll event of the burst.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

/// One recorded interaction, in the capture layer's wire shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouse: Option<MouseInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_code: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<Modifiers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll: Option<ScrollInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<EventContext>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_start_time: Option<DateTime<Utc>>,
    /// Fields this version does not model, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LogEntry {
    pub fn new(kind: EventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            selector: None,
            element: None,
            mouse: None,
            key: None,
            code: None,
            key_code: None,
            modifiers: None,
            form_data: None,
            scroll: None,
            viewport: None,
            from: None,
            to: None,
            context: None,
            timestamp,
            session_id: None,
            session_start_time: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn page_title(&self) -> Option<&str> {
        self.context
            .as_ref()
            .map(|ctx| ctx.page.title.as_str())
            .filter(|title| !title.is_empty())
    }

    pub fn page_url(&self) -> Option<&str> {
        self.context
            .as_ref()
            .map(|ctx| ctx.page.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

/// Filter constraints accepted by read queries.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EntryFilter {
    pub kinds: Option<Vec<EventKind>>,
    pub session: Option<SessionId>,
    pub since: Option<DateTime<Utc>>,
}

impl EntryFilter {
    pub fn kinds(kinds: Vec<EventKind>) -> Self {
        Self {
            kinds: Some(kinds),
            ..Default::default()
        }
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&entry.kind) {
                return false;
            }
        }
        if let Some(expect) = &self.session {
            if entry.session_id.as_ref() != Some(expect) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.timestamp < since {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn deserializes_capture_layer_click() {
        let raw = json!({
            "type": "click",
            "selector": "#buy",
            "element": {
                "tagName": "button",
                "text": "Buy",
                "value": null,
                "placeholder": null,
                "type": "submit",
                "position": {"x": 10, "y": 20, "width": 80, "height": 30},
                "visible": true,
                "attributes": {"id": "buy", "className": null, "name": null}
            },
            "mouse": {"x": 12, "y": 25, "button": 2, "ctrlKey": true, "shiftKey": false, "altKey": false, "metaKey": false},
            "timestamp": "2024-05-01T10:00:00.250Z",
            "frameUrl": "https://shop.test/frame"
        });
        let entry: LogEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(entry.kind, EventKind::Click);
        assert_eq!(entry.selector.as_deref(), Some("#buy"));
        let mouse = entry.mouse.unwrap();
        assert_eq!(mouse.button, 2);
        assert!(mouse.modifiers.ctrl_key);
        let element = entry.element.as_ref().unwrap();
        assert_eq!(element.input_type.as_deref(), Some("submit"));
        assert_eq!(element.attributes.id.as_deref(), Some("buy"));
        assert_eq!(
            entry.extra.get("frameUrl"),
            Some(&json!("https://shop.test/frame"))
        );

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["mouse"]["ctrlKey"], json!(true));
        assert_eq!(back["frameUrl"], json!("https://shop.test/frame"));
        assert!(back.get("sessionId").is_none());
    }

    #[test]
    fn scroll_direction_prefers_vertical() {
        assert_eq!(ScrollDirection::from_delta(3.0, 40.0), ScrollDirection::Down);
        assert_eq!(ScrollDirection::from_delta(3.0, -40.0), ScrollDirection::Up);
        assert_eq!(ScrollDirection::from_delta(-30.0, 0.0), ScrollDirection::Left);
        assert_eq!(ScrollDirection::from_delta(5.0, 5.0), ScrollDirection::Right);
        assert_eq!(ScrollDirection::from_delta(0.0, 0.0), ScrollDirection::None);
    }

    #[test]
    fn filter_by_kind_session_and_time() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let mut entry = LogEntry::new(EventKind::Focus, ts);
        entry.session_id = Some(SessionId::from("s1"));

        assert!(EntryFilter::default().matches(&entry));
        assert!(EntryFilter::kinds(vec![EventKind::Focus]).matches(&entry));
        assert!(!EntryFilter::kinds(vec![EventKind::Click]).matches(&entry));

        let other_session = EntryFilter {
            session: Some(SessionId::from("s2")),
            ..Default::default()
        };
        assert!(!other_session.matches(&entry));

        let later = EntryFilter {
            since: Some(ts + chrono::Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!later.matches(&entry));
    }
}
