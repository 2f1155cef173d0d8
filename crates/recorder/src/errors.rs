use selector_synth::SynthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("no element matches '{0}'")]
    TargetNotFound(String),

    #[error("element '{query}' is not a {expected}")]
    WrongTarget { query: String, expected: &'static str },

    #[error(transparent)]
    Document(#[from] SynthError),
}

pub type RecorderResult<T> = Result<T, RecorderError>;
