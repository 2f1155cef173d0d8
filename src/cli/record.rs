use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use serde::Deserialize;
use tracing::{debug, info, warn};

use soulrecorder_event_store::{LogEntry, Modifiers, MouseInfo};
use soulrecorder_recorder::{
    Clock, KeyInfo, ManualClock, PageHost, Recorder, RecorderOptions, StaticPage,
};

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct RecordArgs {
    /// HTML file the interactions happen on
    pub html: PathBuf,

    /// YAML or JSON file listing the interactions
    #[arg(short, long, value_name = "FILE")]
    pub script: PathBuf,

    /// Page URL to report (defaults to the script's url, then a file:// URL)
    #[arg(long)]
    pub url: Option<String>,

    /// Timestamp of the first event (RFC 3339, defaults to now)
    #[arg(long)]
    pub start: Option<DateTime<Utc>>,

    /// Print the captured entries instead of storing them
    #[arg(long)]
    pub dry_run: bool,
}

/// Interactions replayed against a static page
#[derive(Debug, Clone, Deserialize)]
pub struct RecordScript {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub viewport: Option<ViewportSpec>,
    /// Pause between consecutive interactions
    #[serde(default = "default_gap_ms")]
    pub gap_ms: u64,
    pub steps: Vec<RecordStep>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ViewportSpec {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecordStep {
    Click {
        target: String,
        #[serde(default)]
        button: u8,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default)]
        modifiers: Vec<String>,
    },
    Type {
        target: String,
        text: String,
    },
    Key {
        target: String,
        key: String,
        #[serde(default)]
        modifiers: Vec<String>,
    },
    Focus {
        target: String,
    },
    Blur,
    Submit {
        target: String,
    },
    Scroll {
        x: f64,
        y: f64,
        #[serde(default = "default_ticks")]
        ticks: u32,
    },
    Navigate {
        url: String,
    },
    Wait {
        ms: u64,
    },
}

fn default_gap_ms() -> u64 {
    80
}

fn default_ticks() -> u32 {
    5
}

/// Interval between synthetic wheel ticks
const TICK_MS: i64 = 16;

pub async fn cmd_record(args: RecordArgs, ctx: &CliContext) -> Result<()> {
    let script = load_script(&args.script).await?;
    let source = tokio::fs::read_to_string(&args.html)
        .await
        .with_context(|| format!("reading {}", args.html.display()))?;
    let url = match args.url.clone().or_else(|| script.url.clone()) {
        Some(url) => url,
        None => file_url(&args.html)?,
    };

    let start = args.start.unwrap_or_else(Utc::now);
    let entries = play(&source, &url, &script, ctx.config().recorder_options(), start)?;
    info!(events = entries.len(), %url, "captured scripted interactions");

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let log = ctx.event_log().await?;
    let session = log.current_session().await?;
    let total = entries.len();
    for entry in entries {
        let ack = log.append(entry).await;
        if !ack.success {
            bail!(
                "failed to store entry: {}",
                ack.error.unwrap_or_else(|| "unknown error".into())
            );
        }
    }
    println!("Recorded {} events into session {}", total, session.session_id);
    Ok(())
}

async fn load_script(path: &Path) -> Result<RecordScript> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let script = if is_json {
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
    } else {
        serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
    };
    Ok(script)
}

fn file_url(path: &Path) -> Result<String> {
    let absolute = std::fs::canonicalize(path)
        .with_context(|| format!("resolving {}", path.display()))?;
    Ok(format!("file://{}", absolute.display()))
}

/// Run `script` against `source` and return the captured entries in order.
pub fn play(
    source: &str,
    url: &str,
    script: &RecordScript,
    options: RecorderOptions,
    start: DateTime<Utc>,
) -> Result<Vec<LogEntry>> {
    let mut page = StaticPage::parse(source, url);
    if let Some(viewport) = script.viewport {
        page = page.with_viewport(viewport.width, viewport.height);
    }
    if let Some(title) = &script.title {
        page = page.with_title(title.clone());
    }

    let clock = Arc::new(ManualClock::new(start));
    let idle = millis(options.scroll_idle_ms.saturating_add(1)).context("scroll_idle_ms")?;
    let gap = millis(script.gap_ms).context("gap_ms")?;
    let mut player = Player {
        recorder: Recorder::with_clock(page, options, clock.clone()),
        clock,
        gap,
        entries: Vec::new(),
    };

    let load = player.recorder.page_load();
    player.entries.push(load);
    for (idx, step) in script.steps.iter().enumerate() {
        player
            .step(step)
            .and_then(|()| player.settle(player.gap))
            .with_context(|| format!("step {} ({})", idx + 1, step.name()))?;
    }
    player.settle(idle)?;
    Ok(player.entries)
}

fn millis(ms: u64) -> Result<Duration> {
    i64::try_from(ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .with_context(|| format!("{ms}ms is too long"))
}

impl RecordStep {
    fn name(&self) -> &'static str {
        match self {
            RecordStep::Click { .. } => "click",
            RecordStep::Type { .. } => "type",
            RecordStep::Key { .. } => "key",
            RecordStep::Focus { .. } => "focus",
            RecordStep::Blur => "blur",
            RecordStep::Submit { .. } => "submit",
            RecordStep::Scroll { .. } => "scroll",
            RecordStep::Navigate { .. } => "navigate",
            RecordStep::Wait { .. } => "wait",
        }
    }
}

struct Player {
    recorder: Recorder<StaticPage>,
    clock: Arc<ManualClock>,
    gap: Duration,
    entries: Vec<LogEntry>,
}

impl Player {
    fn step(&mut self, step: &RecordStep) -> Result<()> {
        match step {
            RecordStep::Click {
                target,
                button,
                x,
                y,
                modifiers,
            } => {
                let node = self.recorder.host().resolve(target)?;
                if is_focusable(&self.recorder.host().inspect(&node).tag_name) {
                    self.focus(node)?;
                }
                let mouse = MouseInfo {
                    x: *x,
                    y: *y,
                    button: *button,
                    modifiers: parse_modifiers(modifiers)?,
                };
                let entry = self.recorder.on_click(&node, mouse);
                self.entries.push(entry);
            }
            RecordStep::Type { target, text } => {
                let node = self.recorder.host().resolve(target)?;
                self.focus(node)?;
                for (idx, ch) in text.chars().enumerate() {
                    if idx > 0 {
                        self.advance(self.gap)?;
                    }
                    let key = ch.to_string();
                    let mut info = KeyInfo::new(key.clone());
                    info.modifiers.shift_key = ch.is_uppercase();
                    if let Some(entry) = self.recorder.on_keydown(&node, info) {
                        self.entries.push(entry);
                    }
                    self.recorder.host_mut().type_text(node, &key);
                }
            }
            RecordStep::Key {
                target,
                key,
                modifiers,
            } => {
                let node = self.recorder.host().resolve(target)?;
                self.focus(node)?;
                let mut info = KeyInfo::new(key.clone());
                info.modifiers = parse_modifiers(modifiers)?;
                match self.recorder.on_keydown(&node, info) {
                    Some(entry) => self.entries.push(entry),
                    None => warn!(%target, %key, "key press on a non-editable element was not recorded"),
                }
                if key == "Backspace" {
                    let mut value = self.recorder.host().inspect(&node).value.unwrap_or_default();
                    value.pop();
                    self.recorder.host_mut().set_value(node, value);
                }
            }
            RecordStep::Focus { target } => {
                let node = self.recorder.host().resolve(target)?;
                self.focus(node)?;
            }
            RecordStep::Blur => self.recorder.host_mut().blur(),
            RecordStep::Submit { target } => {
                let host = self.recorder.host();
                let form = host.resolve_form(target)?;
                let fields = host.form_fields(form)?;
                let entry = self.recorder.on_submit(&form, &fields);
                self.entries.push(entry);
            }
            RecordStep::Scroll { x, y, ticks } => self.scroll(*x, *y, (*ticks).max(1))?,
            RecordStep::Navigate { url } => {
                self.recorder.host_mut().set_url(url.clone());
                self.recorder.host_mut().blur();
            }
            RecordStep::Wait { ms } => {
                self.advance(millis(*ms)?)?;
            }
        }
        Ok(())
    }

    fn advance(&self, by: Duration) -> Result<DateTime<Utc>> {
        self.clock
            .advance(by)
            .context("timestamp moved past the representable range")
    }

    fn focus(&mut self, node: selector_synth::NodeId) -> Result<()> {
        self.recorder.host_mut().focus(node);
        if let Some(entry) = self.recorder.on_focus_in(&node) {
            self.entries.push(entry);
            self.advance(Duration::milliseconds(1))?;
        }
        Ok(())
    }

    fn scroll(&mut self, x: f64, y: f64, ticks: u32) -> Result<()> {
        let from = self.recorder.host().scroll_position();
        for tick in 1..=ticks {
            let ratio = f64::from(tick) / f64::from(ticks);
            let next_x = from.x + (x - from.x) * ratio;
            let next_y = from.y + (y - from.y) * ratio;
            self.recorder.host_mut().scroll_to(next_x, next_y);
            let now = self.clock.now();
            if let Some(entry) = self.recorder.on_scroll(now) {
                self.entries.push(entry);
            }
            if tick < ticks {
                self.advance(Duration::milliseconds(TICK_MS))?;
            }
        }
        debug!(x, y, ticks, "scrolled");
        Ok(())
    }

    /// Let time pass, then collect what the page reports on its own.
    fn settle(&mut self, by: Duration) -> Result<()> {
        let now = self.advance(by)?;
        if let Some(entry) = self.recorder.poll_scroll_end(now) {
            self.entries.push(entry);
        }
        if let Some(entry) = self.recorder.check_navigation() {
            self.entries.push(entry);
        }
        Ok(())
    }
}

fn is_focusable(tag: &str) -> bool {
    ["INPUT", "TEXTAREA", "SELECT", "BUTTON", "A"]
        .iter()
        .any(|focusable| tag.eq_ignore_ascii_case(focusable))
}

fn parse_modifiers(names: &[String]) -> Result<Modifiers> {
    let mut modifiers = Modifiers::default();
    for name in names {
        match name.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => modifiers.ctrl_key = true,
            "shift" => modifiers.shift_key = true,
            "alt" | "option" => modifiers.alt_key = true,
            "meta" | "cmd" | "command" => modifiers.meta_key = true,
            other => bail!("unknown modifier '{}'", other),
        }
    }
    Ok(modifiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use soulrecorder_core_types::EventKind;

    const PAGE: &str = r#"<html><head><title>Login</title></head><body>
        <form id="login">
          <input id="user" name="user">
          <input id="pass" name="password" type="password">
          <button class="btn submit">Sign in</button>
        </form>
        <p>footer</p>
    </body></html>"#;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn run(yaml: &str) -> Vec<LogEntry> {
        let script: RecordScript = serde_yaml::from_str(yaml).unwrap();
        play(PAGE, "https://app.test/login", &script, RecorderOptions::default(), start()).unwrap()
    }

    fn kinds(entries: &[LogEntry]) -> Vec<EventKind> {
        entries.iter().map(|entry| entry.kind).collect()
    }

    #[test]
    fn typing_focuses_once_and_records_each_key() {
        let entries = run(
            "steps:\n  - action: type\n    target: '#user'\n    text: ab\n  - action: key\n    target: '#user'\n    key: Enter\n",
        );
        assert_eq!(
            kinds(&entries),
            vec![
                EventKind::PageLoad,
                EventKind::Focus,
                EventKind::Keypress,
                EventKind::Keypress,
                EventKind::Keypress,
            ]
        );
        assert_eq!(entries[3].element.as_ref().unwrap().value.as_deref(), Some("a"));
        assert_eq!(entries[4].key.as_deref(), Some("Enter"));
    }

    #[test]
    fn submit_masks_password_and_scroll_is_summarized() {
        let entries = run(
            r##"
steps:
  - action: type
    target: "#pass"
    text: "x"
  - action: submit
    target: button
  - action: scroll
    x: 0
    y: 400
    ticks: 4
"##,
        );
        let submit = entries
            .iter()
            .find(|entry| entry.kind == EventKind::FormSubmit)
            .unwrap();
        assert_eq!(submit.selector.as_deref(), Some("#login"));
        let data = submit.form_data.as_ref().unwrap();
        assert_eq!(data.get("password").map(String::as_str), Some("[MASKED]"));

        let tail = &entries[entries.len() - 2..];
        assert_eq!(kinds(tail), vec![EventKind::ScrollStart, EventKind::Scroll]);
        let summary = tail[1].scroll.unwrap();
        assert_eq!(summary.y, 400.0);
        assert_eq!(summary.distance, Some(400));
    }

    #[test]
    fn navigate_produces_navigation_entry() {
        let entries = run("steps:\n  - action: navigate\n    url: https://app.test/home\n");
        let nav = entries.last().unwrap();
        assert_eq!(nav.kind, EventKind::Navigation);
        assert_eq!(nav.from.as_deref(), Some("https://app.test/login"));
        assert_eq!(nav.to.as_deref(), Some("https://app.test/home"));
    }

    #[test]
    fn unknown_target_and_modifier_are_errors() {
        let script: RecordScript =
            serde_yaml::from_str("steps:\n  - action: click\n    target: '#missing'\n").unwrap();
        let err = play(PAGE, "https://app.test/", &script, RecorderOptions::default(), start())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("step 1 (click)"));
        assert!(parse_modifiers(&["hyper".to_string()]).is_err());
    }

    #[test]
    fn oversized_waits_fail_the_step_instead_of_panicking() {
        let script: RecordScript =
            serde_yaml::from_str("steps:\n  - action: wait\n    ms: 9000000000000000000\n").unwrap();
        let err = play(PAGE, "https://app.test/", &script, RecorderOptions::default(), start())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("step 1 (wait)"));

        let script: RecordScript =
            serde_yaml::from_str("steps:\n  - action: wait\n    ms: 9000000000000000\n").unwrap();
        let err = play(PAGE, "https://app.test/", &script, RecorderOptions::default(), start())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("representable range"));

        let script: RecordScript = serde_yaml::from_str("gap_ms: 18446744073709551615\nsteps: []\n").unwrap();
        assert!(play(PAGE, "https://app.test/", &script, RecorderOptions::default(), start()).is_err());
    }
}
