use thiserror::Error;

use soulrecorder_core_types::SoulError;

#[derive(Clone, Debug, Error)]
pub enum EsErrorKind {
    #[error("storage read failed: {0}")]
    StorageRead(String),
    #[error("storage write failed: {0}")]
    StorageWrite(String),
    #[error("malformed stored value under '{key}': {reason}")]
    Malformed { key: String, reason: String },
    #[error("export failed: {0}")]
    ExportFailed(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Debug, Error)]
#[error(transparent)]
pub struct EsError(pub EsErrorKind);

impl EsError {
    pub fn new(kind: EsErrorKind) -> Self {
        Self(kind)
    }

    pub fn kind(&self) -> &EsErrorKind {
        &self.0
    }
}

impl From<EsError> for SoulError {
    fn from(value: EsError) -> Self {
        SoulError::new(value.to_string())
    }
}

impl From<EsErrorKind> for EsError {
    fn from(kind: EsErrorKind) -> Self {
        EsError(kind)
    }
}

pub type EsResult<T> = Result<T, EsError>;
