//! Core types for selector synthesis

use serde::{Deserialize, Serialize};

/// Synthesis strategy enumeration
///
/// Strategies are evaluated in [`SelectorStrategy::fallback_chain`] order and
/// the first one that produces a selector wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorStrategy {
    /// `#id`, verified unique
    Id,

    /// `[data-testid="…"]` and friends, trusted without verification
    TestAttribute,

    /// `tag.class1.class2`, verified unique
    ClassCombination,

    /// Bounded `ancestor > … > element` path
    AncestorPath,

    /// No element was supplied
    None,
}

impl SelectorStrategy {
    /// Get strategy name as string
    pub fn name(&self) -> &'static str {
        match self {
            SelectorStrategy::Id => "id",
            SelectorStrategy::TestAttribute => "test_attribute",
            SelectorStrategy::ClassCombination => "class_combination",
            SelectorStrategy::AncestorPath => "ancestor_path",
            SelectorStrategy::None => "none",
        }
    }

    /// Get all strategies in evaluation order
    pub fn fallback_chain() -> Vec<SelectorStrategy> {
        vec![
            SelectorStrategy::Id,
            SelectorStrategy::TestAttribute,
            SelectorStrategy::ClassCombination,
            SelectorStrategy::AncestorPath,
        ]
    }
}

/// Combinator placed between ancestor path segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCombinator {
    /// ` > ` - each segment is the direct parent of the next
    #[default]
    Child,

    /// ` ` - any ancestor
    Descendant,
}

impl PathCombinator {
    pub fn separator(&self) -> &'static str {
        match self {
            PathCombinator::Child => " > ",
            PathCombinator::Descendant => " ",
        }
    }
}

/// Tunables for the synthesizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthOptions {
    /// Maximum number of ancestor path segments
    pub max_depth: usize,

    /// Maximum class names appended to one path segment
    pub max_classes_per_segment: usize,

    /// Transient state classes ignored in path segments (case-insensitive)
    pub state_classes: Vec<String>,

    /// Test id attributes, checked in order
    pub test_id_attributes: Vec<String>,

    /// Generic id attribute checked after the test id attributes
    pub data_id_attribute: String,

    /// Separator between path segments
    pub combinator: PathCombinator,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            max_depth: 5,
            max_classes_per_segment: 2,
            state_classes: vec![
                "active".into(),
                "hover".into(),
                "focus".into(),
                "selected".into(),
            ],
            test_id_attributes: vec!["data-testid".into(), "data-test-id".into()],
            data_id_attribute: "data-id".into(),
            combinator: PathCombinator::Child,
        }
    }
}

impl SynthOptions {
    /// Set maximum path depth (at least one segment is always allowed)
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set path combinator
    pub fn with_combinator(mut self, combinator: PathCombinator) -> Self {
        self.combinator = combinator;
        self
    }

    pub(crate) fn depth_bound(&self) -> usize {
        self.max_depth.max(1)
    }

    pub fn is_state_class(&self, class: &str) -> bool {
        self.state_classes
            .iter()
            .any(|state| state.eq_ignore_ascii_case(class))
    }

    /// Attributes consulted by the test attribute strategy, in priority order
    pub fn stable_attributes(&self) -> impl Iterator<Item = &str> {
        self.test_id_attributes
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.data_id_attribute.as_str()))
            .filter(|attr| !attr.is_empty())
    }
}

/// Result of a synthesis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synthesis {
    /// Selector string, empty when no element was supplied
    pub selector: String,

    /// Strategy that produced the selector
    pub strategy: SelectorStrategy,

    /// Whether the selector was verified to match exactly one node
    pub unique: bool,

    /// Number of path segments (1 for single-step strategies)
    pub segments: usize,
}

impl Synthesis {
    /// Result for an absent element
    pub fn empty() -> Self {
        Self {
            selector: String::new(),
            strategy: SelectorStrategy::None,
            unique: false,
            segments: 0,
        }
    }

    pub(crate) fn single(selector: String, strategy: SelectorStrategy, unique: bool) -> Self {
        Self {
            selector,
            strategy,
            unique,
            segments: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selector.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_chain_order() {
        let chain = SelectorStrategy::fallback_chain();
        assert_eq!(
            chain,
            vec![
                SelectorStrategy::Id,
                SelectorStrategy::TestAttribute,
                SelectorStrategy::ClassCombination,
                SelectorStrategy::AncestorPath,
            ]
        );
    }

    #[test]
    fn state_classes_match_case_insensitively() {
        let options = SynthOptions::default();
        assert!(options.is_state_class("Active"));
        assert!(options.is_state_class("SELECTED"));
        assert!(!options.is_state_class("activated"));
    }

    #[test]
    fn stable_attributes_keep_priority() {
        let options = SynthOptions::default();
        let attrs: Vec<&str> = options.stable_attributes().collect();
        assert_eq!(attrs, vec!["data-testid", "data-test-id", "data-id"]);
    }

    #[test]
    fn zero_depth_still_allows_one_segment() {
        let options = SynthOptions::default().with_max_depth(0);
        assert_eq!(options.depth_bound(), 1);
    }
}
