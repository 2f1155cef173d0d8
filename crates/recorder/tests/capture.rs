use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use soulrecorder_core_types::EventKind;
use soulrecorder_event_store::{Modifiers, MouseInfo, ScrollDirection};
use soulrecorder_recorder::{
    Clock, FormField, KeyInfo, ManualClock, Recorder, RecorderOptions, StaticPage,
};

const PAGE: &str = r#"<!DOCTYPE html><html><head><title>Checkout</title></head><body>
  <nav><a class="nav-link active" href="/">Home</a><a class="nav-link" href="/cart">Cart</a></nav>
  <form id="pay">
    <input id="email" name="email" placeholder="you@example.com">
    <input name="credit_card" data-testid="cc">
    <button type="submit" class="btn primary">Pay</button>
  </form>
  <p>Plain text</p>
</body></html>"#;

fn recorder() -> (Recorder<StaticPage>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    ));
    let page = StaticPage::parse(PAGE, "https://shop.test/checkout");
    let recorder = Recorder::with_clock(page, RecorderOptions::default(), clock.clone());
    (recorder, clock)
}

#[test]
fn click_carries_selector_element_and_context() {
    let (mut rec, clock) = recorder();
    let button = rec.host().resolve("button").unwrap();
    let mouse = MouseInfo {
        x: 40.0,
        y: 300.0,
        button: 0,
        modifiers: Modifiers {
            shift_key: true,
            ..Default::default()
        },
    };

    let entry = rec.on_click(&button, mouse);
    assert_eq!(entry.kind, EventKind::Click);
    assert_eq!(entry.selector.as_deref(), Some("button.btn.primary"));
    assert_eq!(entry.timestamp, clock.now());
    let element = entry.element.unwrap();
    assert_eq!(element.tag_name, "button");
    assert_eq!(element.text.as_deref(), Some("Pay"));
    assert_eq!(element.input_type.as_deref(), Some("submit"));
    let context = entry.context.unwrap();
    assert_eq!(context.page.title, "Checkout");
    assert_eq!(context.page.domain, "shop.test");
    assert!(context.active_element.is_none());
    assert!(entry.mouse.unwrap().modifiers.shift_key);
}

#[test]
fn keydown_only_recorded_on_editable_targets() {
    let (mut rec, _) = recorder();
    let email = rec.host().resolve("#email").unwrap();
    let paragraph = rec.host().resolve("p").unwrap();
    rec.host_mut().focus(email);

    let entry = rec
        .on_keydown(&email, KeyInfo {
            key: "a".into(),
            code: "KeyA".into(),
            key_code: 65,
            modifiers: Modifiers::default(),
        })
        .unwrap();
    assert_eq!(entry.key.as_deref(), Some("a"));
    assert_eq!(entry.key_code, Some(65));
    assert_eq!(entry.selector.as_deref(), Some("#email"));
    let active = entry.context.unwrap().active_element.unwrap();
    assert_eq!(active.tag_name, "input");
    assert_eq!(active.selector, "#email");

    assert!(rec.on_keydown(&paragraph, KeyInfo::new("a")).is_none());
}

#[test]
fn submit_masks_sensitive_fields() {
    let (mut rec, _) = recorder();
    let form = rec.host().resolve_form("#pay").unwrap();
    let cc = rec.host().resolve("[data-testid=cc]").unwrap();
    rec.host_mut().set_value(cc, "4111111111111111");
    let email = rec.host().resolve("#email").unwrap();
    rec.host_mut().set_value(email, "ada@shop.test");

    let fields = rec.host().form_fields(form).unwrap();
    let entry = rec.on_submit(&form, &fields);
    assert_eq!(entry.kind, EventKind::FormSubmit);
    assert_eq!(entry.selector.as_deref(), Some("#pay"));
    let data = entry.form_data.unwrap();
    assert_eq!(data["email"], "ada@shop.test");
    assert_eq!(data["credit_card"], "[MASKED]");

    let explicit = rec.on_submit(&form, &[FormField::file("upload")]);
    assert_eq!(explicit.form_data.unwrap()["upload"], "[FILE]");
}

#[test]
fn focus_is_deduplicated_per_recorder() {
    let (mut rec, _) = recorder();
    let email = rec.host().resolve("#email").unwrap();
    let link = rec.host().resolve("a").unwrap();

    assert!(rec.on_focus_in(&email).is_some());
    assert!(rec.on_focus_in(&email).is_none());
    let entry = rec.on_focus_in(&link).unwrap();
    assert_eq!(entry.selector.as_deref(), Some("a.nav-link.active"));
    assert!(rec.on_focus_in(&email).is_some());

    let (mut other, _) = recorder();
    assert!(other.on_focus_in(&email).is_some());
}

#[test]
fn scroll_burst_produces_start_and_summary() {
    let (mut rec, clock) = recorder();
    let t0 = clock.now();

    rec.host_mut().scroll_to(0.0, 120.0);
    let start = rec.on_scroll(t0 + Duration::milliseconds(10)).unwrap();
    assert_eq!(start.kind, EventKind::ScrollStart);
    assert_eq!(start.scroll.unwrap().start_y, 0.0);

    rec.host_mut().scroll_to(0.0, 240.0);
    assert!(rec.on_scroll(t0 + Duration::milliseconds(60)).is_none());
    assert!(rec.poll_scroll_end(t0 + Duration::milliseconds(100)).is_none());

    let summary = rec.poll_scroll_end(t0 + Duration::milliseconds(210)).unwrap();
    assert_eq!(summary.kind, EventKind::Scroll);
    let scroll = summary.scroll.unwrap();
    assert_eq!(scroll.delta_y, Some(240.0));
    assert_eq!(scroll.distance, Some(240));
    assert_eq!(scroll.direction, Some(ScrollDirection::Down));
    assert_eq!(scroll.velocity, Some(2400));
    assert_eq!(scroll.duration, Some(50));
    assert_eq!(summary.viewport.unwrap().width, 1280.0);
    assert_eq!(summary.context.unwrap().scroll.y, 240.0);
}

#[test]
fn navigation_and_page_load() {
    let (mut rec, _) = recorder();
    assert_eq!(rec.page_load().kind, EventKind::PageLoad);
    assert!(rec.check_navigation().is_none());

    rec.host_mut().set_url("https://shop.test/done");
    let nav = rec.check_navigation().unwrap();
    assert_eq!(nav.from.as_deref(), Some("https://shop.test/checkout"));
    assert_eq!(nav.to.as_deref(), Some("https://shop.test/done"));
    assert!(rec.check_navigation().is_none());
}
