//! Element and page context snapshots

use selector_synth::{SelectorSynthesizer, SynthOptions};
use soulrecorder_event_store::{
    ActiveElement, ElementAttributes, ElementContext, EventContext, PageInfo, Position,
    ScrollPosition, Viewport,
};
use url::Url;

use crate::host::{ElementFacts, PageHost};

/// Snapshot of an element, positioned in document coordinates.
pub fn element_context(
    facts: &ElementFacts,
    scroll: ScrollPosition,
    viewport: Viewport,
    text_max_len: usize,
) -> ElementContext {
    let rect = facts.rect;
    let text = normalize_text(&facts.text_content, text_max_len);
    ElementContext {
        tag_name: facts.tag_name.to_ascii_lowercase(),
        text: non_empty(Some(text)),
        value: non_empty(facts.value.clone()),
        placeholder: non_empty(facts.placeholder.clone()),
        input_type: non_empty(facts.input_type.clone()),
        position: Position {
            x: (rect.left + scroll.x).round() as i64,
            y: (rect.top + scroll.y).round() as i64,
            width: rect.width.round() as i64,
            height: rect.height.round() as i64,
        },
        visible: !rect.is_empty() && rect.top < viewport.height && rect.bottom() > 0.0,
        attributes: ElementAttributes {
            id: non_empty(facts.id.clone()),
            class_name: non_empty(facts.class_name.clone()),
            name: non_empty(facts.name.clone()),
        },
    }
}

/// Page context captured alongside every entry.
pub fn event_context<H: PageHost>(host: &H, selector_options: &SynthOptions) -> EventContext {
    let url = host.url();
    let active_element = host.active_element().map(|node| {
        let facts = host.inspect(&node);
        let synth = SelectorSynthesizer::with_options(host.document(), selector_options.clone());
        ActiveElement {
            tag_name: facts.tag_name.to_ascii_lowercase(),
            selector: synth.synthesize(Some(&node)),
        }
    });
    EventContext {
        viewport: host.viewport(),
        scroll: host.scroll_position(),
        page: PageInfo {
            title: host.title(),
            domain: domain_of(&url),
            url,
        },
        active_element,
    }
}

/// Host name of `url`, empty for opaque or unparsable URLs
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_default()
}

fn normalize_text(raw: &str, max_len: usize) -> String {
    raw.trim().chars().take(max_len).collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Rect;

    fn viewport() -> Viewport {
        Viewport {
            width: 1280.0,
            height: 720.0,
        }
    }

    #[test]
    fn position_is_offset_by_scroll_and_rounded() {
        let facts = ElementFacts {
            tag_name: "BUTTON".into(),
            text_content: "   Save changes  ".into(),
            rect: Rect {
                left: 10.4,
                top: 20.6,
                width: 99.5,
                height: 30.2,
            },
            id: Some(String::new()),
            class_name: Some("btn primary".into()),
            ..Default::default()
        };
        let ctx = element_context(&facts, ScrollPosition { x: 0.0, y: 500.0 }, viewport(), 100);
        assert_eq!(ctx.tag_name, "button");
        assert_eq!(ctx.text.as_deref(), Some("Save changes"));
        assert_eq!(
            ctx.position,
            Position {
                x: 10,
                y: 521,
                width: 100,
                height: 30
            }
        );
        assert!(ctx.visible);
        assert_eq!(ctx.attributes.id, None);
        assert_eq!(ctx.attributes.class_name.as_deref(), Some("btn primary"));
    }

    #[test]
    fn offscreen_or_empty_rects_are_invisible() {
        let below = ElementFacts {
            rect: Rect {
                left: 0.0,
                top: 800.0,
                width: 10.0,
                height: 10.0,
            },
            ..Default::default()
        };
        let zero = ElementFacts::default();
        let scroll = ScrollPosition::default();
        assert!(!element_context(&below, scroll, viewport(), 100).visible);
        assert!(!element_context(&zero, scroll, viewport(), 100).visible);
    }

    #[test]
    fn text_is_cut_by_characters() {
        let facts = ElementFacts {
            text_content: "ééééé".into(),
            ..Default::default()
        };
        let ctx = element_context(&facts, ScrollPosition::default(), viewport(), 3);
        assert_eq!(ctx.text.as_deref(), Some("ééé"));
    }

    #[test]
    fn domain_extraction() {
        assert_eq!(domain_of("https://shop.example.com/cart?x=1"), "shop.example.com");
        assert_eq!(domain_of("file:///tmp/page.html"), "");
        assert_eq!(domain_of("not a url"), "");
    }
}
