use std::path::PathBuf;

/// Only daily data is stored; blob and calendar names carry this suffix.
pub const DAY_FREQ: &str = "day";

/// Main conversion configuration
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConvertConfig {
    /// Directory with one raw file per instrument
    pub source_dir: PathBuf,
    /// Root of the binary store (`calendars/`, `features/`, `instruments/`)
    pub store_root: PathBuf,
    /// Data frequency
    #[serde(default = "default_freq")]
    pub freq: String,
}

fn default_freq() -> String {
    DAY_FREQ.to_string()
}

impl ConvertConfig {
    /// Creates a daily-frequency config.
    pub fn new(source_dir: impl Into<PathBuf>, store_root: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            store_root: store_root.into(),
            freq: default_freq(),
        }
    }
}
