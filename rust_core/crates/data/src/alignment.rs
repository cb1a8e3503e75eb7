//! Calendar alignment of raw series.

use chrono::NaiveDate;

use qbin_types::{Field, SymbolCode};

use crate::calendar::TradingCalendar;
use crate::error::DataError;
use crate::ingest::RawSeries;

/// Gap share above which alignment logs a warning.
const GAP_WARN_RATIO: f64 = 0.05;

/// Raw series reindexed onto its contiguous calendar slice.
#[derive(Debug, Clone)]
pub struct AlignedSeries {
    /// Instrument.
    pub symbol: SymbolCode,
    /// Calendar index of the first observed date.
    pub start_index: usize,
    /// First observed date.
    pub first_date: NaiveDate,
    /// Last observed date.
    pub last_date: NaiveDate,
    /// One column per entry of [`Field::ALL`], same order.
    columns: Vec<Vec<f32>>,
    /// Alignment statistics.
    pub stats: AlignmentStats,
}

impl AlignedSeries {
    /// Aligned values of `field`.
    #[must_use]
    pub fn column(&self, field: Field) -> &[f32] {
        &self.columns[field.position()]
    }

    /// Number of values per field (`end_index - start_index + 1`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.stats.aligned_len
    }

    /// Returns `true` if no calendar dates are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.aligned_len == 0
    }

    /// Calendar index of the last observed date.
    #[must_use]
    pub fn end_index(&self) -> usize {
        self.start_index + self.stats.aligned_len - 1
    }
}

/// Alignment statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentStats {
    /// Raw rows placed on the calendar.
    pub observed_rows: usize,
    /// Length of the calendar slice.
    pub aligned_len: usize,
    /// Calendar dates without a raw row (filled with `NaN`).
    pub filled_gaps: usize,
    /// `filled_gaps / aligned_len`.
    pub gap_ratio: f64,
}

/// Reindexes `raw` onto `calendar[start..=end]`, where start/end are the
/// calendar indices of its earliest/latest date. Row order does not matter.
/// Holes become `NaN`; without a source factor column the factor is 1.0 over
/// the whole slice.
///
/// # Errors
/// - [`DataError::EmptyData`] when `raw` has no rows.
/// - [`DataError::AlignmentFailure`] when a raw date is missing from `calendar`.
pub fn align_series(raw: &RawSeries, calendar: &TradingCalendar) -> Result<AlignedSeries, DataError> {
    let (Some(first_date), Some(last_date)) = (raw.dates().min(), raw.dates().max()) else {
        return Err(DataError::EmptyData);
    };

    let index_map = calendar.index_map();
    let locate = |date: NaiveDate| {
        index_map.get(&date).copied().ok_or_else(|| {
            DataError::AlignmentFailure(format!("{}: date {date} not in calendar", raw.symbol))
        })
    };
    let start_index = locate(first_date)?;
    let end_index = locate(last_date)?;
    let aligned_len = end_index - start_index + 1;

    let mut columns: Vec<Vec<f32>> = Field::ALL
        .iter()
        .map(|&field| {
            let fill = if field == Field::Factor && !raw.has_factor {
                1.0
            } else {
                f32::NAN
            };
            vec![fill; aligned_len]
        })
        .collect();

    for bar in &raw.bars {
        // date >= first_date, so its index is >= start_index
        let offset = locate(bar.date)? - start_index;
        for (column, &field) in columns.iter_mut().zip(Field::ALL.iter()) {
            #[allow(clippy::cast_possible_truncation)]
            let value = bar.value(field) as f32;
            column[offset] = value;
        }
    }

    let observed_rows = raw.bars.len();
    let filled_gaps = aligned_len.saturating_sub(observed_rows);
    #[allow(clippy::cast_precision_loss)]
    let gap_ratio = filled_gaps as f64 / aligned_len as f64;
    if gap_ratio > GAP_WARN_RATIO {
        tracing::warn!(
            "{}: filled {} calendar gaps ({:.2}%)",
            raw.symbol,
            filled_gaps,
            gap_ratio * 100.0
        );
    }

    Ok(AlignedSeries {
        symbol: raw.symbol.clone(),
        start_index,
        first_date,
        last_date,
        columns,
        stats: AlignmentStats {
            observed_rows,
            aligned_len,
            filled_gaps,
            gap_ratio,
        },
    })
}
