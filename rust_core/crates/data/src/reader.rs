//! Feature reader over the binary store.
//!
//! Resolves `$`-prefixed field names, decodes blobs, and slices them by
//! calendar index into a (date, instrument)-indexed frame.

use std::path::Path;

use chrono::NaiveDate;

use qbin_types::{Field, SymbolCode};

use crate::calendar::TradingCalendar;
use crate::encoder::VALUE_BYTES;
use crate::error::DataError;
use crate::registry::InstrumentRegistry;
use crate::store::StoreLayout;

/// Decoded blob: start calendar index plus values.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBlob {
    /// Calendar index of the first value.
    pub start_index: usize,
    /// Values in calendar order.
    pub values: Vec<f32>,
}

impl DecodedBlob {
    /// Value at absolute calendar index `idx`, `None` outside coverage.
    #[must_use]
    pub fn value_at(&self, idx: usize) -> Option<f32> {
        idx.checked_sub(self.start_index)
            .and_then(|offset| self.values.get(offset).copied())
    }

    /// Calendar index one past the last value.
    #[must_use]
    pub fn end_exclusive(&self) -> usize {
        self.start_index + self.values.len()
    }
}

/// Decodes a blob.
///
/// # Errors
/// [`DataError::CorruptData`] when the length is not a positive multiple of
/// four or the header is not a non-negative integer.
pub fn decode_blob(bytes: &[u8]) -> Result<DecodedBlob, DataError> {
    if bytes.len() < VALUE_BYTES || bytes.len() % VALUE_BYTES != 0 {
        return Err(DataError::CorruptData(format!(
            "Invalid blob length: {}",
            bytes.len()
        )));
    }

    let mut chunks = bytes
        .chunks_exact(VALUE_BYTES)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]));
    let header = chunks.next().unwrap_or(f32::NAN);
    if !header.is_finite() || header < 0.0 || header.fract() != 0.0 {
        return Err(DataError::CorruptData(format!(
            "Invalid blob header: {header}"
        )));
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let start_index = header as usize;
    Ok(DecodedBlob {
        start_index,
        values: chunks.collect(),
    })
}

/// Reads and decodes one blob file.
///
/// # Errors
/// [`DataError::FileNotFound`] or any [`decode_blob`] error.
pub fn read_blob(path: &Path) -> Result<DecodedBlob, DataError> {
    let bytes = std::fs::read(path)
        .map_err(|e| DataError::FileNotFound(path.display().to_string(), e.to_string()))?;
    decode_blob(&bytes)
}

/// One (date, instrument) row of a feature query.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    /// Trading date.
    pub date: NaiveDate,
    /// Uppercase instrument (`SH600001`).
    pub instrument: String,
    /// Values in column order; `NaN` where missing.
    pub values: Vec<f32>,
}

/// Result of a feature query, rows sorted by date then instrument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFrame {
    /// `$`-prefixed column names.
    pub columns: Vec<String>,
    /// Rows.
    pub rows: Vec<FeatureRow>,
}

impl FeatureFrame {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value for (date, instrument, column). Instrument and column match
    /// case-insensitively; the column accepts `close` or `$close`.
    #[must_use]
    pub fn value(&self, date: NaiveDate, instrument: &str, column: &str) -> Option<f32> {
        let field: Field = column.parse().ok()?;
        let col = self.columns.iter().position(|c| *c == field.query_name())?;
        self.rows
            .iter()
            .find(|r| r.date == date && r.instrument.eq_ignore_ascii_case(instrument))
            .and_then(|r| r.values.get(col).copied())
    }
}

/// Read-only view of a store: calendar + registry + blobs.
#[derive(Debug, Clone)]
pub struct FeatureReader {
    layout: StoreLayout,
    calendar: TradingCalendar,
    registry: InstrumentRegistry,
}

impl FeatureReader {
    /// Opens the store at `root`.
    ///
    /// # Errors
    /// Calendar or registry load errors.
    pub fn open(root: &Path) -> Result<Self, DataError> {
        let layout = StoreLayout::new(root);
        let calendar = TradingCalendar::load(&layout.calendar_path())?;
        let registry = InstrumentRegistry::load(&layout.registry_path())?;
        Ok(Self {
            layout,
            calendar,
            registry,
        })
    }

    /// Loaded calendar.
    #[must_use]
    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    /// Loaded registry.
    #[must_use]
    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    /// Queries `fields` for `instruments` over `[start, end]`.
    ///
    /// Instruments missing from the registry are skipped with a warning.
    ///
    /// # Errors
    /// - [`DataError::UnknownField`] for an unknown field name.
    /// - [`DataError::InvalidSymbol`] for an unparsable instrument.
    /// - [`DataError::FileNotFound`] / [`DataError::CorruptData`] for missing or
    ///   inconsistent blobs.
    pub fn features<I, F>(
        &self,
        instruments: &[I],
        fields: &[F],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FeatureFrame, DataError>
    where
        I: AsRef<str>,
        F: AsRef<str>,
    {
        let fields: Vec<Field> = fields
            .iter()
            .map(|f| {
                f.as_ref()
                    .parse::<Field>()
                    .map_err(|e| DataError::UnknownField(e.0))
            })
            .collect::<Result<_, _>>()?;
        let columns = fields.iter().map(Field::query_name).collect();

        let Some((lo, hi)) = self.calendar.bounds_within(start, end) else {
            return Ok(FeatureFrame {
                columns,
                rows: Vec::new(),
            });
        };

        let mut rows = Vec::new();
        for instrument in instruments {
            let symbol = SymbolCode::parse_qualified(instrument.as_ref())?;
            if self.registry.get(&symbol.registry_key()).is_none() {
                tracing::warn!("Instrument {} not in registry, skipping", symbol.registry_key());
                continue;
            }

            let blobs = fields
                .iter()
                .map(|&field| self.load_blob(&symbol, field))
                .collect::<Result<Vec<_>, _>>()?;

            let Some(cover_lo) = blobs.iter().map(|b| b.start_index).min() else {
                continue;
            };
            let cover_hi = blobs.iter().map(DecodedBlob::end_exclusive).max().unwrap_or(cover_lo);

            let first = lo.max(cover_lo);
            let last_exclusive = (hi + 1).min(cover_hi);
            for idx in first..last_exclusive {
                let Some(date) = self.calendar.date_at(idx) else {
                    break;
                };
                rows.push(FeatureRow {
                    date,
                    instrument: symbol.registry_key(),
                    values: blobs
                        .iter()
                        .map(|b| b.value_at(idx).unwrap_or(f32::NAN))
                        .collect(),
                });
            }
        }

        rows.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.instrument.cmp(&b.instrument))
        });
        Ok(FeatureFrame { columns, rows })
    }

    fn load_blob(&self, symbol: &SymbolCode, field: Field) -> Result<DecodedBlob, DataError> {
        let blob = read_blob(&self.layout.feature_path(symbol, field))?;
        if blob.end_exclusive() > self.calendar.len() {
            return Err(DataError::CorruptData(format!(
                "{symbol}/{field} covers index {} beyond calendar length {}",
                blob.end_exclusive() - 1,
                self.calendar.len()
            )));
        }
        Ok(blob)
    }
}
