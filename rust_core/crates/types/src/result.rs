use chrono::NaiveDate;

/// Conversion run summary.
/// Symbol order follows the order source files were discovered.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConversionReport {
    /// Number of eligible source files found
    pub files_discovered: usize,
    /// Length of the merged trading calendar
    pub calendar_len: usize,
    /// Whether the calendar file was rewritten
    pub calendar_persisted: bool,
    /// Number of registry entries after the merge
    pub registry_len: usize,
    /// Whether the registry file was rewritten
    pub registry_persisted: bool,
    /// First previously persisted date whose calendar index moved in this run
    #[serde(default)]
    pub calendar_shifted_from: Option<NaiveDate>,
    /// Registered symbols not rewritten this run whose blobs reach the shifted range
    #[serde(default)]
    pub stale_symbols: Vec<String>,
    /// One entry per discovered file
    pub symbols: Vec<SymbolSummary>,
}

impl ConversionReport {
    /// Number of symbols whose blobs were all written.
    #[must_use]
    pub fn converted_count(&self) -> usize {
        self.symbols
            .iter()
            .filter(|s| matches!(s.outcome, SymbolOutcome::Converted { .. }))
            .count()
    }

    /// Number of files dropped from the run.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.symbols.len() - self.converted_count()
    }

    /// Looks up a summary by lowercase symbol (`sh600001`).
    #[must_use]
    pub fn summary(&self, symbol: &str) -> Option<&SymbolSummary> {
        self.symbols
            .iter()
            .find(|s| s.symbol.as_deref().is_some_and(|v| v.eq_ignore_ascii_case(symbol)))
    }
}

/// Per-file outcome of a conversion run
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SymbolSummary {
    /// Source file name
    pub source: String,
    /// Derived symbol, absent when the file name did not yield one
    pub symbol: Option<String>,
    /// Result for this file
    pub outcome: SymbolOutcome,
}

/// Success or skip reason for one symbol
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolOutcome {
    /// All feature blobs were written
    Converted {
        /// First observed date
        first_date: NaiveDate,
        /// Last observed date
        last_date: NaiveDate,
        /// Calendar index of `first_date`
        start_index: usize,
        /// Number of aligned values per field
        aligned_len: usize,
        /// Calendar dates filled with `NaN`
        filled_gaps: usize,
        /// Total bytes over all field blobs
        bytes_written: usize,
    },
    /// Symbol dropped from this run
    Skipped {
        /// Pipeline stage where it was dropped
        stage: SkipStage,
        /// Diagnostic message
        reason: String,
    },
}

/// Pipeline stage at which a symbol was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipStage {
    /// Reading or parsing the source file failed
    Ingest,
    /// Another file already supplied this symbol
    Duplicate,
    /// Calendar alignment failed
    Align,
    /// Writing a blob failed
    Encode,
}

/// Error result information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorResult {
    /// Error category
    pub category: String,
    /// Error message
    pub message: String,
    /// Additional error details
    #[serde(default)]
    pub details: serde_json::Value,
}
