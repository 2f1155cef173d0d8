//! `scraper` backed document for fixtures and offline synthesis

use std::path::Path;

pub use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use crate::document::DomDocument;
use crate::errors::{SynthError, SynthResult};

/// Parsed HTML document addressed by tree node ids
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parse a full document; missing `html`/`head`/`body` are synthesized
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// Read and parse a document from disk
    pub fn from_path(path: impl AsRef<Path>) -> SynthResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::parse(&source))
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Contents of `<title>`, trimmed
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|title| title.text().collect::<String>().trim().to_string())
            .filter(|title| !title.is_empty())
    }

    /// All elements matching `query`, in document order
    pub fn select_all(&self, query: &str) -> SynthResult<Vec<NodeId>> {
        let selector = parse_query(query)?;
        Ok(self.html.select(&selector).map(|el| el.id()).collect())
    }

    /// First element matching `query`, erroring when nothing matches
    pub fn select_one(&self, query: &str) -> SynthResult<NodeId> {
        self.select_all(query)?
            .into_iter()
            .next()
            .ok_or_else(|| SynthError::TargetNotFound(query.to_string()))
    }

    /// Descendants of `scope` matching `query`, in document order
    pub fn select_within(&self, scope: NodeId, query: &str) -> SynthResult<Vec<NodeId>> {
        let selector = parse_query(query)?;
        Ok(self
            .element(scope)
            .map(|el| el.select(&selector).map(|found| found.id()).collect())
            .unwrap_or_default())
    }

    /// Nearest ancestor-or-self matching `query`
    pub fn closest(&self, node: NodeId, query: &str) -> SynthResult<Option<NodeId>> {
        let selector = parse_query(query)?;
        let mut current = self.element(node);
        while let Some(el) = current {
            if selector.matches(&el) {
                return Ok(Some(el.id()));
            }
            current = el.parent().and_then(ElementRef::wrap);
        }
        Ok(None)
    }

    /// Element view for a node id
    pub fn element(&self, node: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(node).and_then(ElementRef::wrap)
    }

    /// Text content of an element, whitespace-collapsed
    pub fn text_content(&self, node: NodeId) -> String {
        self.element(node)
            .map(|el| {
                el.text()
                    .flat_map(str::split_whitespace)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }
}

fn parse_query(query: &str) -> SynthResult<Selector> {
    Selector::parse(query).map_err(|err| SynthError::InvalidQuery {
        query: query.to_string(),
        reason: format!("{:?}", err),
    })
}

impl DomDocument for HtmlDocument {
    type Node = NodeId;

    fn tag_name(&self, node: &NodeId) -> String {
        self.element(*node)
            .map(|el| el.value().name().to_ascii_lowercase())
            .unwrap_or_default()
    }

    fn id(&self, node: &NodeId) -> Option<&str> {
        self.element(*node)
            .and_then(|el| el.value().attr("id"))
            .filter(|id| !id.is_empty())
    }

    fn classes(&self, node: &NodeId) -> Vec<String> {
        self.attribute(node, "class")
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<&str> {
        self.element(*node).and_then(|el| el.value().attr(name))
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        let parent = self.html.tree.get(*node)?.parent()?;
        ElementRef::wrap(parent).map(|el| el.id())
    }

    fn is_root_container(&self, node: &NodeId) -> bool {
        self.element(*node)
            .map(|el| el.value().name().eq_ignore_ascii_case("body"))
            .unwrap_or(false)
    }

    fn same_tag_siblings(&self, node: &NodeId) -> Vec<NodeId> {
        let Some(el) = self.element(*node) else {
            return Vec::new();
        };
        let Some(parent) = el.parent() else {
            return vec![*node];
        };
        let tag = el.value().name();
        parent
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|sibling| sibling.value().name() == tag)
            .map(|sibling| sibling.id())
            .collect()
    }

    fn count_matches(&self, query: &str) -> usize {
        match Selector::parse(query) {
            Ok(selector) => self.html.select(&selector).count(),
            Err(_) => 0,
        }
    }

    fn first_match(&self, query: &str) -> Option<NodeId> {
        let selector = Selector::parse(query).ok()?;
        self.html.select(&selector).next().map(|el| el.id())
    }
}
