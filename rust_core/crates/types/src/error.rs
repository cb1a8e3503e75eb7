use thiserror::Error;

/// Core error types for qbin value types
#[derive(Debug, Error)]
pub enum CoreError {
    /// Instrument code could not be parsed
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Field name is not one of the stored features
    #[error("Unknown field: {0}")]
    UnknownField(String),
}

impl From<crate::field::ParseFieldError> for CoreError {
    fn from(err: crate::field::ParseFieldError) -> Self {
        CoreError::UnknownField(err.0)
    }
}
