//! Selector synthesis strategies
//!
//! Four strategies in evaluation order:
//! 1. Id - `#id` when the document holds exactly one such element
//! 2. TestAttribute - `[data-testid="…"]`, trusted by convention
//! 3. ClassCombination - `tag.a.b` when it matches exactly one element
//! 4. AncestorPath - bounded path towards `body`, early exit once unique

use std::collections::VecDeque;

use tracing::trace;

use crate::document::DomDocument;
use crate::escape::{attribute_selector, escape_ident};
use crate::types::{SelectorStrategy, SynthOptions, Synthesis};

/// A single step of the synthesis chain
pub trait Strategy {
    /// Strategy type
    fn strategy_type(&self) -> SelectorStrategy;

    /// Strategy name
    fn name(&self) -> &'static str {
        self.strategy_type().name()
    }

    /// Try to produce a selector; `None` hands over to the next strategy
    fn attempt<D: DomDocument>(
        &self,
        doc: &D,
        node: &D::Node,
        options: &SynthOptions,
    ) -> Option<Synthesis>;
}

/// Unique identifier strategy
pub struct IdStrategy;

impl Strategy for IdStrategy {
    fn strategy_type(&self) -> SelectorStrategy {
        SelectorStrategy::Id
    }

    fn attempt<D: DomDocument>(
        &self,
        doc: &D,
        node: &D::Node,
        _options: &SynthOptions,
    ) -> Option<Synthesis> {
        let id = doc.id(node).filter(|id| !id.is_empty())?;
        let selector = format!("#{}", escape_ident(id));
        let matches = doc.count_matches(&selector);
        if matches == 1 {
            Some(Synthesis::single(selector, SelectorStrategy::Id, true))
        } else {
            trace!(%selector, matches, "id is not unique");
            None
        }
    }
}

/// Test attribute strategy
pub struct TestAttributeStrategy;

impl Strategy for TestAttributeStrategy {
    fn strategy_type(&self) -> SelectorStrategy {
        SelectorStrategy::TestAttribute
    }

    fn attempt<D: DomDocument>(
        &self,
        doc: &D,
        node: &D::Node,
        options: &SynthOptions,
    ) -> Option<Synthesis> {
        options.stable_attributes().find_map(|attr| {
            doc.attribute(node, attr)
                .filter(|value| !value.is_empty())
                .map(|value| {
                    Synthesis::single(
                        attribute_selector(attr, value),
                        SelectorStrategy::TestAttribute,
                        false,
                    )
                })
        })
    }
}

/// Tag plus full class list strategy
pub struct ClassCombinationStrategy;

impl Strategy for ClassCombinationStrategy {
    fn strategy_type(&self) -> SelectorStrategy {
        SelectorStrategy::ClassCombination
    }

    fn attempt<D: DomDocument>(
        &self,
        doc: &D,
        node: &D::Node,
        _options: &SynthOptions,
    ) -> Option<Synthesis> {
        let classes = doc.classes(node);
        if classes.is_empty() {
            return None;
        }
        let selector = format!(
            "{}{}",
            doc.tag_name(node),
            class_suffix(classes.iter().map(String::as_str))
        );
        let matches = doc.count_matches(&selector);
        if matches == 1 {
            Some(Synthesis::single(
                selector,
                SelectorStrategy::ClassCombination,
                true,
            ))
        } else {
            trace!(%selector, matches, "class combination is not unique");
            None
        }
    }
}

/// Bounded ancestor path strategy; always produces a result
pub struct AncestorPathStrategy;

impl Strategy for AncestorPathStrategy {
    fn strategy_type(&self) -> SelectorStrategy {
        SelectorStrategy::AncestorPath
    }

    fn attempt<D: DomDocument>(
        &self,
        doc: &D,
        node: &D::Node,
        options: &SynthOptions,
    ) -> Option<Synthesis> {
        let separator = options.combinator.separator();
        let bound = options.depth_bound();
        let mut segments: VecDeque<String> = VecDeque::with_capacity(bound);
        let mut current = Some(node.clone());

        while let Some(element) = current {
            if doc.is_root_container(&element) {
                break;
            }
            segments.push_front(path_segment(doc, &element, options));

            let path = join_segments(&segments, separator);
            if doc.count_matches(&path) == 1 {
                return Some(Synthesis {
                    selector: path,
                    strategy: SelectorStrategy::AncestorPath,
                    unique: true,
                    segments: segments.len(),
                });
            }
            if segments.len() >= bound {
                trace!(%path, bound, "depth bound reached without a unique path");
                break;
            }
            current = doc.parent(&element);
        }

        if segments.is_empty() && doc.is_root_container(node) {
            let tag = doc.tag_name(node);
            let unique = doc.count_matches(&tag) == 1;
            return Some(Synthesis::single(tag, SelectorStrategy::AncestorPath, unique));
        }

        Some(Synthesis {
            selector: join_segments(&segments, separator),
            strategy: SelectorStrategy::AncestorPath,
            unique: false,
            segments: segments.len(),
        })
    }
}

/// One path level: `tag`, up to N non-state classes, same-tag position
pub fn path_segment<D: DomDocument>(doc: &D, node: &D::Node, options: &SynthOptions) -> String {
    let mut segment = doc.tag_name(node);
    let classes = doc.classes(node);
    segment.push_str(&class_suffix(
        classes
            .iter()
            .map(String::as_str)
            .filter(|class| !options.is_state_class(class))
            .take(options.max_classes_per_segment),
    ));
    if let Some(position) = doc.same_tag_position(node) {
        segment.push_str(&format!(":nth-of-type({})", position));
    }
    segment
}

fn class_suffix<'a>(classes: impl Iterator<Item = &'a str>) -> String {
    classes
        .filter(|class| !class.is_empty())
        .map(|class| format!(".{}", escape_ident(class)))
        .collect()
}

fn join_segments(segments: &VecDeque<String>, separator: &str) -> String {
    segments
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(separator)
}
