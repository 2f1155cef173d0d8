//! Capability interface over the host document

use std::fmt::Debug;

/// Read-only view of a live, queryable element tree.
///
/// The synthesizer never mutates the document. Implementations decide what
/// a node handle is; handles must compare equal when they denote the same
/// element.
pub trait DomDocument {
    type Node: Clone + PartialEq + Debug;

    /// Lowercase tag name
    fn tag_name(&self, node: &Self::Node) -> String;

    /// Value of the `id` attribute, if present and non-empty
    fn id(&self, node: &Self::Node) -> Option<&str>;

    /// Class names in attribute order
    fn classes(&self, node: &Self::Node) -> Vec<String>;

    /// Raw attribute value
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<&str>;

    /// Parent element, `None` when the parent is not an element
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Whether the node is the outermost content container (`body`)
    fn is_root_container(&self, node: &Self::Node) -> bool;

    /// Siblings sharing the node's tag, the node included, in document order
    fn same_tag_siblings(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Number of elements matching `query`; an unparsable query matches nothing
    fn count_matches(&self, query: &str) -> usize;

    /// First element matching `query` in document order
    fn first_match(&self, query: &str) -> Option<Self::Node>;

    /// 1-based rank among same-tag siblings, `None` when the tag is not repeated
    fn same_tag_position(&self, node: &Self::Node) -> Option<usize> {
        let siblings = self.same_tag_siblings(node);
        if siblings.len() <= 1 {
            return None;
        }
        siblings
            .iter()
            .position(|sibling| sibling == node)
            .map(|idx| idx + 1)
    }

    /// Whether `query` resolves to exactly `node`
    fn resolves_to(&self, query: &str, node: &Self::Node) -> bool {
        self.count_matches(query) == 1 && self.first_match(query).as_ref() == Some(node)
    }
}
