//! Global trading calendar.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;

use crate::error::DataError;
use crate::store::write_text_atomic;

/// Date format of the calendar file.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sorted, deduplicated trading dates. A date's position is its calendar index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradingCalendar {
    dates: Vec<NaiveDate>,
}

impl TradingCalendar {
    /// Builds a calendar from dates in any order.
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let unique: BTreeSet<NaiveDate> = dates.into_iter().collect();
        Self {
            dates: unique.into_iter().collect(),
        }
    }

    /// Loads a persisted calendar. A missing file yields an empty calendar.
    ///
    /// # Errors
    /// - [`DataError::CalendarUnreadable`] when the file exists but cannot be read.
    /// - [`DataError::CorruptData`] for unparsable, duplicate, or out-of-order lines.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(DataError::CalendarUnreadable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let mut dates: Vec<NaiveDate> = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            let value = line.trim();
            if value.is_empty() {
                continue;
            }
            let date = NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
                DataError::CorruptData(format!(
                    "Invalid calendar date at line {}: {value} ({e})",
                    line_no + 1
                ))
            })?;
            // Existing blobs index into this order; never silently re-sort it.
            if let Some(prev) = dates.last()
                && date <= *prev
            {
                return Err(DataError::CorruptData(format!(
                    "Non-monotonic calendar date at line {}: {date} <= {prev}",
                    line_no + 1
                )));
            }
            dates.push(date);
        }

        Ok(Self { dates })
    }

    /// Returns the union of this calendar and `new_dates`.
    /// Merging the same dates twice yields the same calendar as merging once.
    #[must_use]
    pub fn merge(&self, new_dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self::new(self.dates.iter().copied().chain(new_dates))
    }

    /// Calendar index of `date`.
    #[must_use]
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Date → index lookup table.
    #[must_use]
    pub fn index_map(&self) -> HashMap<NaiveDate, usize> {
        self.dates.iter().enumerate().map(|(i, d)| (*d, i)).collect()
    }

    /// First date of `previous` whose index differs in this calendar.
    ///
    /// `None` when every date of `previous` keeps its index, i.e. this
    /// calendar only appends after `previous`'s last date. Blobs written
    /// against `previous` are misaligned from the returned date onward.
    #[must_use]
    pub fn first_shifted_date(&self, previous: &TradingCalendar) -> Option<NaiveDate> {
        previous
            .dates
            .iter()
            .enumerate()
            .find(|(idx, date)| self.dates.get(*idx) != Some(*date))
            .map(|(_, date)| *date)
    }

    /// All dates, ascending.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Date at calendar index `idx`.
    #[must_use]
    pub fn date_at(&self, idx: usize) -> Option<NaiveDate> {
        self.dates.get(idx).copied()
    }

    /// Inclusive slice `[start, end]` of the calendar.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> Option<&[NaiveDate]> {
        if start > end {
            return None;
        }
        self.dates.get(start..=end)
    }

    /// Index bounds of the dates falling inside `[start, end]`, if any.
    #[must_use]
    pub fn bounds_within(&self, start: NaiveDate, end: NaiveDate) -> Option<(usize, usize)> {
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end);
        if lo >= hi { None } else { Some((lo, hi - 1)) }
    }

    /// Number of trading dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns `true` if the calendar holds no dates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Writes one `YYYY-MM-DD` date per line, ascending.
    ///
    /// # Errors
    /// [`DataError::WriteFailed`] when the file cannot be written.
    pub fn persist(&self, path: &Path) -> Result<(), DataError> {
        let mut out = String::with_capacity(self.dates.len() * 11);
        for date in &self.dates {
            let _ = writeln!(out, "{}", date.format(DATE_FORMAT));
        }
        write_text_atomic(path, &out)
    }
}
