//! CSS selector synthesis for recorded elements
//!
//! Given an element of a live document, produce a short selector that
//! re-locates it later. Strategies are tried in order, first success wins:
//! - unique `#id`
//! - stable test attribute (`data-testid`, `data-test-id`, `data-id`)
//! - unique `tag.class.class` combination
//! - bounded ancestor path with same-tag positional disambiguation
//!
//! Uniqueness checks go through the [`DomDocument`] capability trait so the
//! algorithm runs against any queryable tree.

pub mod document;
pub mod errors;
pub mod escape;
#[cfg(feature = "html")]
pub mod html;
pub mod strategies;
pub mod synth;
pub mod types;

pub use document::*;
pub use errors::*;
#[cfg(feature = "html")]
pub use html::{HtmlDocument, NodeId};
pub use synth::*;
pub use types::*;
