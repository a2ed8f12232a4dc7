use thiserror::Error;

/// Failures of a single (athlete, prop) estimation.
///
/// Neither variant is retried inside the engine. `InsufficientData` means the
/// caller should skip the pair; `InvalidConfiguration` is a caller bug.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl EngineError {
    pub fn insufficient(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
