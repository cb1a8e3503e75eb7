//! Conversion error types.

use qbin_types::ErrorResult;
use serde_json::json;
use thiserror::Error;

/// Errors that abort a conversion run.
///
/// Per-file problems never surface here; they are recorded as skipped
/// symbols in the report.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// JSON config parse error
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// Report serialization error
    #[error("report serialization error: {0}")]
    ReportSerialize(String),

    /// Store or source-directory error
    #[error("data error: {0}")]
    Data(#[from] qbin_data::DataError),
}

impl ConvertError {
    /// Returns true if this is a config parse/validation error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ConvertError::ConfigParse(_) | ConvertError::ConfigValidation(_)
        )
    }

    /// Returns the error category for the output contract.
    /// Categories: `config`, `store`, `runtime`
    #[must_use]
    pub fn error_category(&self) -> &'static str {
        match self {
            ConvertError::ConfigParse(_) | ConvertError::ConfigValidation(_) => "config",

            ConvertError::Data(err) if err.is_store_error() => "store",

            ConvertError::Data(_) | ConvertError::ReportSerialize(_) => "runtime",
        }
    }
}

impl From<ConvertError> for ErrorResult {
    fn from(err: ConvertError) -> Self {
        Self {
            category: err.error_category().to_string(),
            message: err.to_string(),
            details: json!({}),
        }
    }
}
