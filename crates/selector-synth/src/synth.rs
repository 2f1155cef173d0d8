//! Strategy chain driver

use tracing::debug;

use crate::document::DomDocument;
use crate::strategies::{
    AncestorPathStrategy, ClassCombinationStrategy, IdStrategy, Strategy, TestAttributeStrategy,
};
use crate::types::{SelectorStrategy, SynthOptions, Synthesis};

/// Synthesizes selectors against one document.
///
/// Holds no state besides its options; results reflect the document at call
/// time, so the same element may get a different selector after the
/// document mutates.
#[derive(Debug, Clone)]
pub struct SelectorSynthesizer<'d, D: DomDocument> {
    doc: &'d D,
    options: SynthOptions,
}

impl<'d, D: DomDocument> SelectorSynthesizer<'d, D> {
    pub fn new(doc: &'d D) -> Self {
        Self {
            doc,
            options: SynthOptions::default(),
        }
    }

    pub fn with_options(doc: &'d D, options: SynthOptions) -> Self {
        Self { doc, options }
    }

    pub fn options(&self) -> &SynthOptions {
        &self.options
    }

    pub fn document(&self) -> &'d D {
        self.doc
    }

    /// Selector for `element`, empty string when absent
    pub fn synthesize(&self, element: Option<&D::Node>) -> String {
        self.synthesize_detailed(element).selector
    }

    /// Selector plus the strategy and verification outcome behind it
    pub fn synthesize_detailed(&self, element: Option<&D::Node>) -> Synthesis {
        let Some(node) = element else {
            return Synthesis::empty();
        };

        for strategy in SelectorStrategy::fallback_chain() {
            if let Some(result) = self.attempt(strategy, node) {
                debug!(
                    strategy = result.strategy.name(),
                    selector = %result.selector,
                    unique = result.unique,
                    "synthesized selector"
                );
                return result;
            }
        }
        Synthesis::empty()
    }

    fn attempt(&self, strategy: SelectorStrategy, node: &D::Node) -> Option<Synthesis> {
        match strategy {
            SelectorStrategy::Id => IdStrategy.attempt(self.doc, node, &self.options),
            SelectorStrategy::TestAttribute => {
                TestAttributeStrategy.attempt(self.doc, node, &self.options)
            }
            SelectorStrategy::ClassCombination => {
                ClassCombinationStrategy.attempt(self.doc, node, &self.options)
            }
            SelectorStrategy::AncestorPath => {
                AncestorPathStrategy.attempt(self.doc, node, &self.options)
            }
            SelectorStrategy::None => None,
        }
    }
}

/// Selector for `element` with default options
pub fn synthesize<D: DomDocument>(doc: &D, element: Option<&D::Node>) -> String {
    SelectorSynthesizer::new(doc).synthesize(element)
}
