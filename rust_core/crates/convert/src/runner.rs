//! High-level conversion runner helpers.

use qbin_types::{ConversionReport, ConvertConfig, DAY_FREQ};

use crate::driver::Converter;
use crate::error::ConvertError;

/// JSON entry point: receives config JSON, returns report JSON.
///
/// # Errors
/// - [`ConvertError::ConfigParse`] when JSON parsing fails.
/// - [`ConvertError::ConfigValidation`] for invalid configuration values.
/// - Any error from [`run_conversion`].
pub fn run_conversion_from_json(config_json: &str) -> Result<String, ConvertError> {
    let config: ConvertConfig = serde_json::from_str(config_json)
        .map_err(|e| ConvertError::ConfigParse(e.to_string()))?;

    let report = run_conversion(&config)?;

    serde_json::to_string(&report).map_err(|e| ConvertError::ReportSerialize(e.to_string()))
}

/// Validates `config` and runs one conversion.
///
/// # Errors
/// - [`ConvertError::ConfigValidation`] before anything is read or written.
/// - [`ConvertError::Data`] for fatal store errors.
pub fn run_conversion(config: &ConvertConfig) -> Result<ConversionReport, ConvertError> {
    validate_config(config)?;
    Converter::new(config).run()
}

/// Checks paths and frequency.
///
/// # Errors
/// [`ConvertError::ConfigValidation`] for empty paths, an unsupported
/// frequency, a missing source directory, or a store root that is not a
/// directory.
pub fn validate_config(config: &ConvertConfig) -> Result<(), ConvertError> {
    if config.source_dir.as_os_str().is_empty() {
        return Err(ConvertError::ConfigValidation(
            "source_dir is empty".to_string(),
        ));
    }
    if config.store_root.as_os_str().is_empty() {
        return Err(ConvertError::ConfigValidation(
            "store_root is empty".to_string(),
        ));
    }

    if config.freq != DAY_FREQ {
        return Err(ConvertError::ConfigValidation(format!(
            "unsupported freq '{}', only '{DAY_FREQ}' is supported",
            config.freq
        )));
    }

    if !config.source_dir.is_dir() {
        return Err(ConvertError::ConfigValidation(format!(
            "source_dir {} is not a directory",
            config.source_dir.display()
        )));
    }
    if config.store_root.exists() && !config.store_root.is_dir() {
        return Err(ConvertError::ConfigValidation(format!(
            "store_root {} exists but is not a directory",
            config.store_root.display()
        )));
    }

    Ok(())
}
