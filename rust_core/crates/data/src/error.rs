//! Data-layer error types.

use thiserror::Error;

/// Errors that can occur while reading, aligning, or writing store data.
#[derive(Debug, Error)]
pub enum DataError {
    /// A required file was not found on disk.
    #[error("File not found: {0} ({1})")]
    FileNotFound(String, String),

    /// CSV/Parquet parsing or decoding failed.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A required column is missing.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A column has an unexpected data type.
    #[error("Invalid column type: {0}")]
    InvalidColumnType(String),

    /// No rows were loaded after reading data.
    #[error("Empty data")]
    EmptyData,

    /// Data violated a store invariant.
    #[error("Corrupt data: {0}")]
    CorruptData(String),

    /// A series could not be placed on the calendar.
    #[error("Alignment failure: {0}")]
    AlignmentFailure(String),

    /// The persisted calendar exists but cannot be read.
    #[error("Calendar unreadable: {path} ({reason})")]
    CalendarUnreadable {
        /// Calendar file path.
        path: String,
        /// Underlying IO error.
        reason: String,
    },

    /// The persisted instrument registry exists but cannot be read.
    #[error("Registry unreadable: {path} ({reason})")]
    RegistryUnreadable {
        /// Registry file path.
        path: String,
        /// Underlying IO error.
        reason: String,
    },

    /// File name or query did not yield a valid instrument code.
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Requested field is not stored.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Calendar index cannot be represented exactly in the f32 header.
    #[error("Calendar index {0} exceeds f32 precision")]
    IndexOverflow(usize),

    /// Writing a store file failed.
    #[error("Write failed: {path} ({reason})")]
    WriteFailed {
        /// Destination path.
        path: String,
        /// Underlying IO error.
        reason: String,
    },
}

impl DataError {
    /// Returns true for errors about persisted store state (calendar,
    /// registry, blobs) rather than raw source files.
    #[must_use]
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            DataError::CalendarUnreadable { .. }
                | DataError::RegistryUnreadable { .. }
                | DataError::CorruptData(_)
                | DataError::IndexOverflow(_)
                | DataError::WriteFailed { .. }
        )
    }
}

impl From<qbin_types::CoreError> for DataError {
    fn from(err: qbin_types::CoreError) -> Self {
        match err {
            qbin_types::CoreError::InvalidSymbol(s) => DataError::InvalidSymbol(s),
            qbin_types::CoreError::UnknownField(s) => DataError::UnknownField(s),
        }
    }
}
