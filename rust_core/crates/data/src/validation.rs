//! Raw series validation.

use qbin_types::{DailyBar, Field};

use crate::error::DataError;

/// Validates a raw series after sorting and deduplication.
///
/// `NaN` cells are allowed and mean "missing"; infinities are not.
///
/// # Errors
/// - [`DataError::EmptyData`] when `bars` is empty.
/// - [`DataError::CorruptData`] for non-increasing dates, infinite values,
///   or negative volume/amount.
pub fn validate_bars(bars: &[DailyBar]) -> Result<(), DataError> {
    if bars.is_empty() {
        return Err(DataError::EmptyData);
    }

    for (i, bar) in bars.iter().enumerate() {
        if let Some(field) = Field::ALL.iter().find(|&&f| bar.value(f).is_infinite()) {
            return Err(DataError::CorruptData(format!(
                "Infinite {field} at {}",
                bar.date
            )));
        }

        if bar.volume < 0.0 || bar.amount < 0.0 {
            return Err(DataError::CorruptData(format!(
                "Negative volume/amount at {}: volume={}, amount={}",
                bar.date, bar.volume, bar.amount
            )));
        }

        if i > 0 && bar.date <= bars[i - 1].date {
            return Err(DataError::CorruptData(format!(
                "Non-monotonic date at index {i}: {} <= {}",
                bar.date,
                bars[i - 1].date
            )));
        }
    }

    Ok(())
}
