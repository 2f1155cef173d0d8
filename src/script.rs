//! Playwright script generation from a recorded log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soulrecorder_core_types::EventKind;
use soulrecorder_event_store::{LogEntry, Modifiers};

/// Pauses at least this long between entries become explicit waits
pub const WAIT_THRESHOLD_MS: i64 = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLanguage {
    JavaScript,
    Python,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ScriptStep {
    Navigate(String),
    Click(String),
    Fill { selector: String, text: String },
    Press { selector: String, key: String },
    Focus(String),
    Wheel { dx: f64, dy: f64 },
    Wait(u64),
    Comment(String),
}

#[derive(Clone, Debug)]
pub struct ScriptOptions {
    pub waits: bool,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self { waits: true }
    }
}

struct PendingFill {
    selector: String,
    text: String,
}

/// Translate log entries (oldest first) into script steps.
pub fn build_script_steps(entries: &[LogEntry], options: &ScriptOptions) -> Vec<ScriptStep> {
    let mut steps = Vec::new();
    let mut pending: Option<PendingFill> = None;
    let mut last_url: Option<String> = None;
    let mut previous_ts: Option<DateTime<Utc>> = None;

    for (idx, entry) in entries.iter().enumerate() {
        if options.waits {
            if let Some(prev) = previous_ts {
                let delta = (entry.timestamp - prev).num_milliseconds();
                if delta >= WAIT_THRESHOLD_MS {
                    flush(&mut pending, &mut steps);
                    steps.push(ScriptStep::Wait(delta as u64));
                }
            }
        }
        previous_ts = Some(entry.timestamp);

        let selector = entry.selector.clone().unwrap_or_default();
        if entry.kind != EventKind::Keypress {
            flush(&mut pending, &mut steps);
        }

        match entry.kind {
            EventKind::PageLoad => {
                if let Some(url) = entry.page_url() {
                    if last_url.as_deref() != Some(url) {
                        steps.push(ScriptStep::Navigate(url.to_string()));
                        last_url = Some(url.to_string());
                    }
                }
            }
            EventKind::Navigation => {
                if let Some(to) = entry.to.as_deref().filter(|to| !to.is_empty()) {
                    if last_url.as_deref() != Some(to) {
                        steps.push(ScriptStep::Navigate(to.to_string()));
                        last_url = Some(to.to_string());
                    }
                }
            }
            EventKind::Click if !selector.is_empty() => steps.push(ScriptStep::Click(selector)),
            EventKind::Keypress if !selector.is_empty() => {
                let key = entry.key.as_deref().unwrap_or_default();
                let modifiers = entry.modifiers.unwrap_or_default();
                keypress(&mut pending, &mut steps, entry, selector, key, modifiers);
            }
            EventKind::Focus if !selector.is_empty() => {
                if !next_targets(entries.get(idx + 1), &selector) {
                    steps.push(ScriptStep::Focus(selector));
                }
            }
            EventKind::FormSubmit => {
                let fields = entry.form_data.as_ref().map(|d| d.len()).unwrap_or(0);
                steps.push(ScriptStep::Comment(format!(
                    "form submitted: {} ({} fields)",
                    selector, fields
                )));
            }
            EventKind::Scroll => {
                if let Some(scroll) = &entry.scroll {
                    let dx = scroll.delta_x.unwrap_or(0.0);
                    let dy = scroll.delta_y.unwrap_or(0.0);
                    if dx != 0.0 || dy != 0.0 {
                        steps.push(ScriptStep::Wheel { dx, dy });
                    }
                }
            }
            _ => {}
        }
    }
    flush(&mut pending, &mut steps);
    steps
}

fn keypress(
    pending: &mut Option<PendingFill>,
    steps: &mut Vec<ScriptStep>,
    entry: &LogEntry,
    selector: String,
    key: &str,
    modifiers: Modifiers,
) {
    if matches!(key, "Shift" | "Control" | "Alt" | "Meta" | "CapsLock" | "") {
        return;
    }
    if pending.as_ref().map(|p| p.selector != selector).unwrap_or(false) {
        flush(pending, steps);
    }

    let chord = modifiers.ctrl_key || modifiers.alt_key || modifiers.meta_key;
    let printable = key.chars().count() == 1 && !chord;
    if printable {
        let fill = pending.get_or_insert_with(|| PendingFill {
            selector: selector.clone(),
            text: entry
                .element
                .as_ref()
                .and_then(|el| el.value.clone())
                .unwrap_or_default(),
        });
        fill.text.push_str(key);
        return;
    }
    if key == "Backspace" && !chord {
        if let Some(fill) = pending.as_mut() {
            fill.text.pop();
            return;
        }
    }
    flush(pending, steps);
    steps.push(ScriptStep::Press {
        selector,
        key: playwright_key(key, modifiers),
    });
}

fn flush(pending: &mut Option<PendingFill>, steps: &mut Vec<ScriptStep>) {
    if let Some(fill) = pending.take() {
        steps.push(ScriptStep::Fill {
            selector: fill.selector,
            text: fill.text,
        });
    }
}

/// Focus immediately followed by an interaction on the same element is implied
fn next_targets(next: Option<&LogEntry>, selector: &str) -> bool {
    next.map(|entry| {
        matches!(entry.kind, EventKind::Click | EventKind::Keypress)
            && entry.selector.as_deref() == Some(selector)
    })
    .unwrap_or(false)
}

fn playwright_key(key: &str, modifiers: Modifiers) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if modifiers.ctrl_key {
        parts.push("Control");
    }
    if modifiers.alt_key {
        parts.push("Alt");
    }
    if modifiers.meta_key {
        parts.push("Meta");
    }
    if modifiers.shift_key && key.chars().count() > 1 {
        parts.push("Shift");
    }
    let key = if key == " " { "Space" } else { key };
    parts.push(key);
    parts.join("+")
}

pub fn generate_script(language: ScriptLanguage, steps: &[ScriptStep]) -> String {
    match language {
        ScriptLanguage::JavaScript => render_javascript(steps),
        ScriptLanguage::Python => render_python(steps),
    }
}

fn render_javascript(steps: &[ScriptStep]) -> String {
    let mut script = String::new();
    script.push_str("const { chromium } = require('playwright');\n\n");
    script.push_str("(async () => {\n");
    script.push_str("  const browser = await chromium.launch();\n");
    script.push_str("  const page = await browser.newPage();\n\n");

    for step in steps {
        script.push_str("  ");
        script.push_str(&js_statement(step));
        script.push('\n');
    }

    script.push('\n');
    script.push_str("  await browser.close();\n");
    script.push_str("})();\n");
    script
}

fn render_python(steps: &[ScriptStep]) -> String {
    let mut script = String::new();
    script.push_str("from playwright.sync_api import sync_playwright\n\n\n");
    script.push_str("def run():\n");
    script.push_str("    with sync_playwright() as p:\n");
    script.push_str("        browser = p.chromium.launch()\n");
    script.push_str("        page = browser.new_page()\n\n");

    for step in steps {
        script.push_str("        ");
        script.push_str(&python_statement(step));
        script.push('\n');
    }

    script.push('\n');
    script.push_str("        browser.close()\n\n\n");
    script.push_str("if __name__ == \"__main__\":\n");
    script.push_str("    run()\n");
    script
}

fn js_statement(step: &ScriptStep) -> String {
    match step {
        ScriptStep::Navigate(url) => format!("await page.goto(\"{}\");", escape_string(url)),
        ScriptStep::Click(selector) => {
            format!("await page.click(\"{}\");", escape_string(selector))
        }
        ScriptStep::Fill { selector, text } => format!(
            "await page.fill(\"{}\", \"{}\");",
            escape_string(selector),
            escape_string(text)
        ),
        ScriptStep::Press { selector, key } => format!(
            "await page.press(\"{}\", \"{}\");",
            escape_string(selector),
            escape_string(key)
        ),
        ScriptStep::Focus(selector) => {
            format!("await page.focus(\"{}\");", escape_string(selector))
        }
        ScriptStep::Wheel { dx, dy } => format!("await page.mouse.wheel({}, {});", dx, dy),
        ScriptStep::Wait(ms) => format!("await page.waitForTimeout({});", ms),
        ScriptStep::Comment(text) => format!("// {}", text.replace('\n', " ")),
    }
}

fn python_statement(step: &ScriptStep) -> String {
    match step {
        ScriptStep::Navigate(url) => format!("page.goto(\"{}\")", escape_string(url)),
        ScriptStep::Click(selector) => format!("page.click(\"{}\")", escape_string(selector)),
        ScriptStep::Fill { selector, text } => format!(
            "page.fill(\"{}\", \"{}\")",
            escape_string(selector),
            escape_string(text)
        ),
        ScriptStep::Press { selector, key } => format!(
            "page.press(\"{}\", \"{}\")",
            escape_string(selector),
            escape_string(key)
        ),
        ScriptStep::Focus(selector) => format!("page.focus(\"{}\")", escape_string(selector)),
        ScriptStep::Wheel { dx, dy } => format!("page.mouse.wheel({}, {})", dx, dy),
        ScriptStep::Wait(ms) => format!("page.wait_for_timeout({})", ms),
        ScriptStep::Comment(text) => format!("# {}", text.replace('\n', " ")),
    }
}

fn escape_string(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}
