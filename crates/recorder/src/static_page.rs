//! Offline page backed by a parsed HTML document

use std::collections::HashMap;
use std::path::Path;

use selector_synth::{DomDocument, HtmlDocument, NodeId};
use soulrecorder_event_store::{ScrollPosition, Viewport};

use crate::errors::{RecorderError, RecorderResult};
use crate::forms::FormField;
use crate::host::{ElementFacts, PageHost, Rect};

const DEFAULT_VIEWPORT: Viewport = Viewport {
    width: 1280.0,
    height: 720.0,
};

/// [`PageHost`] over static HTML.
///
/// Layout is not computed, so every element reports an empty rect. Typed
/// values, focus, scroll offset and URL are tracked so scripted sessions
/// can drive it like a live page.
pub struct StaticPage {
    doc: HtmlDocument,
    url: String,
    title: Option<String>,
    viewport: Viewport,
    scroll: ScrollPosition,
    active: Option<NodeId>,
    values: HashMap<NodeId, String>,
}

impl StaticPage {
    pub fn new(doc: HtmlDocument, url: impl Into<String>) -> Self {
        Self {
            doc,
            url: url.into(),
            title: None,
            viewport: DEFAULT_VIEWPORT,
            scroll: ScrollPosition::default(),
            active: None,
            values: HashMap::new(),
        }
    }

    pub fn parse(source: &str, url: impl Into<String>) -> Self {
        Self::new(HtmlDocument::parse(source), url)
    }

    pub fn from_path(path: impl AsRef<Path>, url: impl Into<String>) -> RecorderResult<Self> {
        Ok(Self::new(HtmlDocument::from_path(path)?, url))
    }

    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = Viewport { width, height };
        self
    }

    /// Override the `<title>` text
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn html(&self) -> &HtmlDocument {
        &self.doc
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.scroll = ScrollPosition { x, y };
    }

    pub fn focus(&mut self, node: NodeId) {
        self.active = Some(node);
    }

    pub fn blur(&mut self) {
        self.active = None;
    }

    pub fn set_value(&mut self, node: NodeId, value: impl Into<String>) {
        self.values.insert(node, value.into());
    }

    /// Append typed text to the current value of `node`
    pub fn type_text(&mut self, node: NodeId, text: &str) {
        let mut value = self.current_value(node).unwrap_or_default();
        value.push_str(text);
        self.values.insert(node, value);
    }

    /// First element matching `query`
    pub fn resolve(&self, query: &str) -> RecorderResult<NodeId> {
        self.doc
            .select_all(query)?
            .into_iter()
            .next()
            .ok_or_else(|| RecorderError::TargetNotFound(query.to_string()))
    }

    /// `query` itself when it is a form, else its enclosing form
    pub fn resolve_form(&self, query: &str) -> RecorderResult<NodeId> {
        let node = self.resolve(query)?;
        self.doc
            .closest(node, "form")?
            .ok_or_else(|| RecorderError::WrongTarget {
                query: query.to_string(),
                expected: "form",
            })
    }

    /// Successful controls of `form`, in document order
    pub fn form_fields(&self, form: NodeId) -> RecorderResult<Vec<FormField>> {
        let controls = self
            .doc
            .select_within(form, "input[name], textarea[name], select[name]")?;
        let mut fields = Vec::new();
        for control in controls {
            let Some(name) = self.doc.attribute(&control, "name").filter(|n| !n.is_empty()) else {
                continue;
            };
            if self.doc.attribute(&control, "disabled").is_some() {
                continue;
            }
            let facts = self.inspect(&control);
            match facts.input_type.as_deref() {
                Some("submit" | "button" | "reset" | "image") => continue,
                Some("checkbox" | "radio") => {
                    if self.doc.attribute(&control, "checked").is_some() {
                        fields.push(FormField::text(name, facts.value.unwrap_or_else(|| "on".into())));
                    }
                }
                Some("file") => fields.push(FormField::file(name)),
                _ => fields.push(FormField::text(name, facts.value.unwrap_or_default())),
            }
        }
        Ok(fields)
    }

    fn current_value(&self, node: NodeId) -> Option<String> {
        if let Some(value) = self.values.get(&node) {
            return Some(value.clone());
        }
        match self.doc.tag_name(&node).as_str() {
            "textarea" => Some(self.doc.text_content(node)),
            "select" => {
                let option = self
                    .doc
                    .select_within(node, "option[selected]")
                    .ok()
                    .and_then(|found| found.into_iter().next())
                    .or_else(|| {
                        self.doc
                            .select_within(node, "option")
                            .ok()
                            .and_then(|found| found.into_iter().next())
                    })?;
                Some(
                    self.doc
                        .attribute(&option, "value")
                        .map(str::to_string)
                        .unwrap_or_else(|| self.doc.text_content(option)),
                )
            }
            "input" | "button" | "option" => {
                self.doc.attribute(&node, "value").map(str::to_string)
            }
            _ => None,
        }
    }

    fn input_type(&self, node: NodeId, tag: &str) -> Option<String> {
        let declared = self
            .doc
            .attribute(&node, "type")
            .map(|t| t.to_ascii_lowercase());
        match tag {
            "input" => Some(declared.unwrap_or_else(|| "text".into())),
            "button" => Some(declared.unwrap_or_else(|| "submit".into())),
            "textarea" => Some("textarea".into()),
            "select" if self.doc.attribute(&node, "multiple").is_some() => {
                Some("select-multiple".into())
            }
            "select" => Some("select-one".into()),
            _ => None,
        }
    }
}

impl PageHost for StaticPage {
    type Doc = HtmlDocument;

    fn document(&self) -> &HtmlDocument {
        &self.doc
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn scroll_position(&self) -> ScrollPosition {
        self.scroll
    }

    fn title(&self) -> String {
        self.title
            .clone()
            .or_else(|| self.doc.title())
            .unwrap_or_default()
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    fn inspect(&self, node: &NodeId) -> ElementFacts {
        let tag = self.doc.tag_name(node);
        let attr = |name: &str| self.doc.attribute(node, name).map(str::to_string);
        ElementFacts {
            tag_name: tag.to_ascii_uppercase(),
            text_content: self.doc.text_content(*node),
            value: self.current_value(*node),
            placeholder: attr("placeholder"),
            input_type: self.input_type(*node, &tag),
            rect: Rect::default(),
            id: attr("id"),
            class_name: attr("class"),
            name: attr("name"),
            content_editable: matches!(
                self.doc.attribute(node, "contenteditable"),
                Some("" | "true")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"<html><head><title>Sign up</title></head><body>
        <form id="signup">
          <input name="email" value="a@b.test">
          <input name="password" type="password">
          <input name="terms" type="checkbox" checked>
          <input name="news" type="checkbox">
          <input name="avatar" type="file">
          <select name="plan"><option value="free">Free</option><option value="pro" selected>Pro</option></select>
          <textarea name="bio">  hi  </textarea>
          <input name="locked" disabled value="x">
          <button type="submit" name="go">Go</button>
        </form>
        <div contenteditable>notes</div>
      </body></html>"#;

    #[test]
    fn title_comes_from_document_unless_overridden() {
        let page = StaticPage::parse(FORM, "https://app.test/signup");
        assert_eq!(page.title(), "Sign up");
        assert_eq!(page.with_title("Other").title(), "Other");
    }

    #[test]
    fn form_fields_follow_successful_controls() {
        let page = StaticPage::parse(FORM, "https://app.test/signup");
        let form = page.resolve_form("#signup").unwrap();
        let fields = page.form_fields(form).unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["email", "password", "terms", "avatar", "plan", "bio"]
        );
        assert_eq!(fields[0], FormField::text("email", "a@b.test"));
        assert_eq!(fields[2], FormField::text("terms", "on"));
        assert_eq!(fields[3], FormField::file("avatar"));
        assert_eq!(fields[4], FormField::text("plan", "pro"));
        assert_eq!(fields[5], FormField::text("bio", "hi"));
    }

    #[test]
    fn resolve_form_walks_up_from_a_control() {
        let page = StaticPage::parse(FORM, "https://app.test/");
        let form = page.resolve("#signup").unwrap();
        assert_eq!(page.resolve_form("input[name=email]").unwrap(), form);
        assert!(matches!(
            page.resolve_form("div").unwrap_err(),
            RecorderError::WrongTarget { .. }
        ));
        assert!(page.resolve("#missing").unwrap_err().is_target_error());
    }

    #[test]
    fn inspect_reports_dom_style_facts() {
        let mut page = StaticPage::parse(FORM, "https://app.test/");
        let email = page.resolve("input[name=email]").unwrap();
        page.type_text(email, "x");
        let facts = page.inspect(&email);
        assert_eq!(facts.tag_name, "INPUT");
        assert_eq!(facts.input_type.as_deref(), Some("text"));
        assert_eq!(facts.value.as_deref(), Some("a@b.testx"));
        assert!(facts.accepts_text());

        let notes = page.resolve("div[contenteditable]").unwrap();
        assert!(page.inspect(&notes).content_editable);
        let button = page.resolve("button").unwrap();
        assert_eq!(page.inspect(&button).input_type.as_deref(), Some("submit"));
    }
}
