//! Error types for document construction and lookups

use thiserror::Error;

/// Synthesis never fails; these errors come from building or querying a
/// fixture document on behalf of a caller.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Query string could not be parsed as a CSS selector
    #[error("Invalid query '{query}': {reason}")]
    InvalidQuery { query: String, reason: String },

    /// No element matched the target query
    #[error("No element matches: {0}")]
    TargetNotFound(String),

    /// Reading the document source failed
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

pub type SynthResult<T> = Result<T, SynthError>;
