//! Text rendering of the event log, newest first

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};
use soulrecorder_core_types::EventKind;
use soulrecorder_event_store::{ElementContext, LogEntry, Modifiers, MouseInfo};

pub const EMPTY_MESSAGE: &str =
    "No events recorded yet.\nStart interacting with web pages to see events here.";

const TEXT_PREVIEW: usize = 30;
const VALUE_PREVIEW: usize = 20;

#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Title of the page the viewer sits on; matching titles are not repeated
    pub current_title: Option<String>,
    /// Render timestamps in the local zone instead of UTC
    pub local_time: bool,
    pub max_log_size: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            current_title: None,
            local_time: false,
            max_log_size: 100,
        }
    }
}

/// Render `entries` (stored order, oldest first) as the log view.
pub fn render_log(entries: &[LogEntry], options: &RenderOptions) -> String {
    let Some(newest) = entries.last() else {
        return format!("{EMPTY_MESSAGE}\n");
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "📊 {} events recorded | Last: {}",
        entries.len(),
        format_timestamp(newest.timestamp, options.local_time)
    );
    let _ = writeln!(
        out,
        "Showing last {} events",
        entries.len().min(options.max_log_size)
    );

    for entry in entries.iter().rev() {
        out.push('\n');
        render_entry(&mut out, entry, options);
    }
    out
}

fn render_entry(out: &mut String, entry: &LogEntry, options: &RenderOptions) {
    let _ = writeln!(
        out,
        "{} {}  {}",
        icon(entry.kind),
        entry.kind,
        format_timestamp(entry.timestamp, options.local_time)
    );

    let selector = entry.selector.as_deref().unwrap_or_default();
    let element = entry.element.as_ref().map(format_element).unwrap_or_default();
    if !selector.is_empty() || !element.is_empty() {
        let _ = writeln!(out, "   {}{}", selector, element);
    }

    match entry.kind {
        EventKind::Click => {
            if let Some(mouse) = &entry.mouse {
                let _ = writeln!(out, "   Mouse: {}", format_mouse(mouse));
            }
        }
        EventKind::Keypress => {
            let modifiers = entry
                .modifiers
                .as_ref()
                .map(modifier_prefix)
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "   Key: {}{}",
                modifiers,
                entry.key.as_deref().unwrap_or_default()
            );
        }
        EventKind::FormSubmit => {
            if let Some(form_data) = &entry.form_data {
                let _ = writeln!(out, "   Form fields: {}", form_data.len());
            }
        }
        EventKind::Scroll => {
            if let Some(scroll) = &entry.scroll {
                let _ = writeln!(out, "   Scroll: ({}, {})", scroll.x, scroll.y);
            }
        }
        EventKind::Navigation => {
            if let (Some(from), Some(to)) = (&entry.from, &entry.to) {
                let _ = writeln!(out, "   {} → {}", from, to);
            }
        }
        _ => {}
    }

    if let Some(title) = entry.page_title() {
        if options.current_title.as_deref() != Some(title) {
            let _ = writeln!(out, "   📄 {}", title);
        }
    }
}

pub fn icon(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Click => "🖱️",
        EventKind::Keypress => "⌨️",
        EventKind::FormSubmit => "📝",
        EventKind::Focus => "🎯",
        EventKind::Scroll => "📜",
        EventKind::Navigation => "🛣️",
        _ => "📋",
    }
}

/// `HH:MM:SS.mmm`
pub fn format_timestamp(ts: DateTime<Utc>, local: bool) -> String {
    if local {
        ts.with_timezone(&Local).format("%H:%M:%S%.3f").to_string()
    } else {
        ts.format("%H:%M:%S%.3f").to_string()
    }
}

/// ` ["text…", value: "…", W×H]`, empty when nothing is known
pub fn format_element(element: &ElementContext) -> String {
    let mut info = Vec::new();
    if let Some(text) = element.text.as_deref().filter(|t| !t.is_empty()) {
        info.push(format!("\"{}\"", preview(text, TEXT_PREVIEW)));
    }
    if let Some(value) = element.value.as_deref().filter(|v| !v.is_empty()) {
        info.push(format!("value: \"{}\"", preview(value, VALUE_PREVIEW)));
    }
    info.push(format!(
        "{}×{}",
        element.position.width, element.position.height
    ));
    format!(" [{}]", info.join(", "))
}

/// `@(x, y) (right) +Ctrl+Shift`
pub fn format_mouse(mouse: &MouseInfo) -> String {
    let button = match mouse.button {
        2 => " (right)",
        1 => " (middle)",
        _ => "",
    };
    let labels = mouse.modifiers.labels();
    let modifiers = if labels.is_empty() {
        String::new()
    } else {
        format!(" +{}", labels.join("+"))
    };
    format!("@({}, {}){}{}", mouse.x, mouse.y, button, modifiers)
}

fn modifier_prefix(modifiers: &Modifiers) -> String {
    let labels = modifiers.labels();
    if labels.is_empty() {
        String::new()
    } else {
        format!("+{} ", labels.join("+"))
    }
}

fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use soulrecorder_event_store::{EventContext, PageInfo, Position};

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 14, 3, 7).unwrap() + Duration::milliseconds(ms)
    }

    fn titled(mut entry: LogEntry, title: &str) -> LogEntry {
        entry.context = Some(EventContext {
            page: PageInfo {
                title: title.into(),
                ..Default::default()
            },
            ..Default::default()
        });
        entry
    }

    #[test]
    fn empty_log_shows_hint() {
        assert_eq!(
            render_log(&[], &RenderOptions::default()),
            format!("{EMPTY_MESSAGE}\n")
        );
    }

    #[test]
    fn newest_first_with_details() {
        let mut click = LogEntry::new(EventKind::Click, at(0));
        click.selector = Some("#buy".into());
        click.element = Some(ElementContext {
            tag_name: "button".into(),
            text: Some("Buy this very long product name right now".into()),
            position: Position {
                x: 0,
                y: 0,
                width: 80,
                height: 24,
            },
            ..Default::default()
        });
        click.mouse = Some(MouseInfo {
            x: 10.0,
            y: 20.0,
            button: 2,
            modifiers: Modifiers {
                ctrl_key: true,
                meta_key: true,
                ..Default::default()
            },
        });
        let click = titled(click, "Shop");

        let mut key = LogEntry::new(EventKind::Keypress, at(1250));
        key.selector = Some("#q".into());
        key.key = Some("k".into());
        key.modifiers = Some(Modifiers {
            ctrl_key: true,
            shift_key: true,
            ..Default::default()
        });
        let key = titled(key, "Other page");

        let options = RenderOptions {
            current_title: Some("Shop".into()),
            ..Default::default()
        };
        let rendered = render_log(&[click, key], &options);
        let expected = "\
📊 2 events recorded | Last: 14:03:08.250
Showing last 2 events

⌨️ keypress  14:03:08.250
   #q
   Key: +Ctrl+Shift k
   📄 Other page

🖱️ click  14:03:07.000
   #buy [\"Buy this very long product nam...\", 80×24]
   Mouse: @(10, 20) (right) +Ctrl+Meta
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn element_value_is_previewed() {
        let element = ElementContext {
            value: Some("abcdefghijklmnopqrstuvwxyz".into()),
            ..Default::default()
        };
        assert_eq!(
            format_element(&element),
            " [value: \"abcdefghijklmnopqrst...\", 0×0]"
        );
    }

    #[test]
    fn summary_caps_shown_count() {
        let entries: Vec<LogEntry> = (0..5)
            .map(|i| LogEntry::new(EventKind::PageLoad, at(i)))
            .collect();
        let options = RenderOptions {
            max_log_size: 3,
            ..Default::default()
        };
        let rendered = render_log(&entries, &options);
        assert!(rendered.contains("📊 5 events recorded"));
        assert!(rendered.contains("Showing last 3 events"));
        assert_eq!(rendered.matches("📋 page_load").count(), 5);
    }
}
