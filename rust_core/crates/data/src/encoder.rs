//! Binary column encoder.
//!
//! Blob layout: `[start_index: f32 LE][value_0: f32 LE]...[value_n-1: f32 LE]`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use qbin_types::Field;

use crate::alignment::AlignedSeries;
use crate::error::DataError;
use crate::store::StoreLayout;

/// Largest calendar index an f32 header holds exactly (2^24).
pub const MAX_START_INDEX: usize = 1 << 24;

/// Bytes per encoded value (and for the header).
pub const VALUE_BYTES: usize = 4;

/// Converts a calendar index into the blob header value.
///
/// # Errors
/// [`DataError::IndexOverflow`] when `start_index` exceeds [`MAX_START_INDEX`].
pub fn header_value(start_index: usize) -> Result<f32, DataError> {
    if start_index > MAX_START_INDEX {
        return Err(DataError::IndexOverflow(start_index));
    }
    #[allow(clippy::cast_precision_loss)]
    let header = start_index as f32;
    Ok(header)
}

/// Encodes one aligned column into `writer`; returns bytes written.
///
/// # Errors
/// - [`DataError::IndexOverflow`] for an unrepresentable start index.
/// - [`DataError::WriteFailed`] when the writer fails.
pub fn encode_to_writer<W: Write>(
    values: &[f32],
    start_index: usize,
    writer: &mut W,
) -> Result<usize, DataError> {
    let header = header_value(start_index)?;
    let write_failed = |e: std::io::Error| DataError::WriteFailed {
        path: "<writer>".to_string(),
        reason: e.to_string(),
    };

    writer.write_all(&header.to_le_bytes()).map_err(write_failed)?;
    for value in values {
        writer.write_all(&value.to_le_bytes()).map_err(write_failed)?;
    }
    Ok(VALUE_BYTES * (values.len() + 1))
}

/// Truncates `path` and writes one blob; returns bytes written.
///
/// # Errors
/// [`DataError::WriteFailed`] / [`DataError::IndexOverflow`].
pub fn encode_field(values: &[f32], start_index: usize, path: &Path) -> Result<usize, DataError> {
    let write_failed = |reason: String| DataError::WriteFailed {
        path: path.display().to_string(),
        reason,
    };

    let file = File::create(path).map_err(|e| write_failed(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    let written = encode_to_writer(values, start_index, &mut writer).map_err(|e| match e {
        DataError::WriteFailed { reason, .. } => write_failed(reason),
        other => other,
    })?;
    writer.flush().map_err(|e| write_failed(e.to_string()))?;
    Ok(written)
}

/// Files written for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSymbol {
    /// `(field, path, bytes)` in [`Field::ALL`] order.
    pub files: Vec<(Field, PathBuf, usize)>,
}

impl EncodedSymbol {
    /// Total bytes over all blobs.
    #[must_use]
    pub fn bytes_written(&self) -> usize {
        self.files.iter().map(|(_, _, bytes)| bytes).sum()
    }
}

/// Writes every field blob of `aligned` under `layout`.
/// Stops at the first failing field; blobs of other symbols are untouched.
///
/// # Errors
/// [`DataError::WriteFailed`] / [`DataError::IndexOverflow`].
pub fn write_symbol(layout: &StoreLayout, aligned: &AlignedSeries) -> Result<EncodedSymbol, DataError> {
    let dir = layout.feature_dir(&aligned.symbol);
    fs::create_dir_all(&dir).map_err(|e| DataError::WriteFailed {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::with_capacity(Field::ALL.len());
    for field in Field::ALL {
        let path = layout.feature_path(&aligned.symbol, field);
        let bytes = encode_field(aligned.column(field), aligned.start_index, &path)?;
        files.push((field, path, bytes));
    }
    Ok(EncodedSymbol { files })
}
