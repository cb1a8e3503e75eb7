//! Raw per-symbol source ingestion (CSV and Parquet).

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{
    Array, Date32Array, Float32Array, Float64Array, Int64Array, LargeStringArray, StringArray,
};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use qbin_types::{DailyBar, Field, SymbolCode};

use crate::error::DataError;
use crate::validation::validate_bars;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Raw source file format, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Comma-separated text with a header row.
    Csv,
    /// Apache Parquet.
    Parquet,
}

impl SourceFormat {
    /// Format for `path`, or `None` when the extension is not supported.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(SourceFormat::Csv),
            "parquet" | "pq" => Some(SourceFormat::Parquet),
            _ => None,
        }
    }
}

/// Canonical column a source label maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceColumn {
    /// Trading date.
    Date,
    /// A stored feature field.
    Value(Field),
}

/// Source label → canonical column. English labels match case-insensitively.
const COLUMN_MAP: [(&str, SourceColumn); 16] = [
    ("日期", SourceColumn::Date),
    ("开盘", SourceColumn::Value(Field::Open)),
    ("收盘", SourceColumn::Value(Field::Close)),
    ("最高", SourceColumn::Value(Field::High)),
    ("最低", SourceColumn::Value(Field::Low)),
    ("成交量", SourceColumn::Value(Field::Volume)),
    ("成交额", SourceColumn::Value(Field::Amount)),
    ("复权因子", SourceColumn::Value(Field::Factor)),
    ("date", SourceColumn::Date),
    ("open", SourceColumn::Value(Field::Open)),
    ("close", SourceColumn::Value(Field::Close)),
    ("high", SourceColumn::Value(Field::High)),
    ("low", SourceColumn::Value(Field::Low)),
    ("volume", SourceColumn::Value(Field::Volume)),
    ("amount", SourceColumn::Value(Field::Amount)),
    ("factor", SourceColumn::Value(Field::Factor)),
];

impl SourceColumn {
    /// Maps a source header label; unmapped labels return `None` and are dropped.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim_start_matches('\u{feff}').trim();
        COLUMN_MAP
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(label))
            .map(|(_, column)| *column)
    }
}

/// Column positions of the canonical fields inside one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    date: usize,
    /// Positions in [`Field::REQUIRED`] order.
    values: [usize; 6],
    factor: Option<usize>,
}

impl ColumnLayout {
    fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Result<Self, DataError> {
        let mut date = None;
        let mut values: [Option<usize>; 6] = [None; 6];
        let mut factor = None;

        // First matching column wins.
        for (idx, label) in labels.into_iter().enumerate() {
            match SourceColumn::from_label(label) {
                Some(SourceColumn::Date) if date.is_none() => date = Some(idx),
                Some(SourceColumn::Value(Field::Factor)) if factor.is_none() => factor = Some(idx),
                Some(SourceColumn::Value(field)) => {
                    if let Some(pos) = Field::REQUIRED.iter().position(|f| *f == field)
                        && values[pos].is_none()
                    {
                        values[pos] = Some(idx);
                    }
                }
                _ => {}
            }
        }

        let date = date.ok_or_else(|| DataError::MissingColumn("date".to_string()))?;
        let mut resolved = [0usize; 6];
        for (pos, field) in Field::REQUIRED.iter().enumerate() {
            resolved[pos] =
                values[pos].ok_or_else(|| DataError::MissingColumn(field.as_str().to_string()))?;
        }

        Ok(Self {
            date,
            values: resolved,
            factor,
        })
    }
}

/// One instrument's raw rows, sorted ascending with unique dates.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    /// Market-qualified code derived from the file name.
    pub symbol: SymbolCode,
    /// Sorted daily rows.
    pub bars: Vec<DailyBar>,
    /// Whether the source carried an adjustment-factor column.
    pub has_factor: bool,
}

impl RawSeries {
    /// Earliest observed date.
    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    /// Latest observed date.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Observed dates, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.bars.iter().map(|b| b.date)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Lists eligible source files (`.csv`, `.parquet`) in `dir`, sorted by file name.
///
/// # Errors
/// [`DataError::FileNotFound`] when the directory cannot be listed.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>, DataError> {
    let not_found = |e: std::io::Error| DataError::FileNotFound(dir.display().to_string(), e.to_string());

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(not_found)? {
        let path = entry.map_err(not_found)?.path();
        if path.is_file() && SourceFormat::from_path(&path).is_some() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Derives the symbol from the file name's first `_`-separated token,
/// e.g. `518880_黄金ETF.csv` → `sh518880`.
///
/// # Errors
/// [`DataError::InvalidSymbol`] when the token is empty or not alphanumeric.
pub fn symbol_from_path(path: &Path) -> Result<SymbolCode, DataError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| DataError::InvalidSymbol(path.display().to_string()))?;
    let token = stem.split('_').next().unwrap_or(stem);
    Ok(SymbolCode::from_raw(token)?)
}

/// Reads one raw source file into a sorted, deduplicated, validated series.
///
/// Exact duplicate rows for one date are collapsed (keep-first); divergent
/// duplicates are an error.
///
/// # Errors
/// - [`DataError::InvalidSymbol`] when the file name yields no code.
/// - [`DataError::FileNotFound`] when the file cannot be opened.
/// - [`DataError::MissingColumn`] / [`DataError::InvalidColumnType`] for schema problems.
/// - [`DataError::ParseError`] for malformed dates or numbers.
/// - [`DataError::EmptyData`] / [`DataError::CorruptData`] from validation.
pub fn ingest(path: &Path) -> Result<RawSeries, DataError> {
    let symbol = symbol_from_path(path)?;
    let format = SourceFormat::from_path(path).ok_or_else(|| {
        DataError::ParseError(format!("Unsupported source file: {}", path.display()))
    })?;

    let (rows, has_factor) = match format {
        SourceFormat::Csv => read_csv_rows(path)?,
        SourceFormat::Parquet => read_parquet_rows(path)?,
    };

    let bars = sort_and_dedup(rows)?;
    validate_bars(&bars)?;

    Ok(RawSeries {
        symbol,
        bars,
        has_factor,
    })
}

/// Parses a source date into a calendar date.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, and `YYYYMMDD`, optionally followed by a
/// time part (`2024-01-02 15:00:00`, `2024-01-02T00:00:00`), which is dropped.
///
/// # Errors
/// [`DataError::ParseError`] when no accepted form matches.
pub fn parse_date(value: &str) -> Result<NaiveDate, DataError> {
    let value = value.trim();
    let date_part = value.split(['T', ' ']).next().unwrap_or(value);
    let invalid = || DataError::ParseError(format!("Invalid date: {value:?}"));

    if date_part.len() == 8 && date_part.bytes().all(|b| b.is_ascii_digit()) {
        let year: i32 = date_part[..4].parse().map_err(|_| invalid())?;
        let month: u32 = date_part[4..6].parse().map_err(|_| invalid())?;
        let day: u32 = date_part[6..].parse().map_err(|_| invalid())?;
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid);
    }

    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .ok_or_else(invalid)
}

fn parse_number(value: &str, column: Field, row: usize) -> Result<f64, DataError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(f64::NAN);
    }
    value.parse::<f64>().map_err(|_| {
        DataError::ParseError(format!("Invalid {column} value at row {row}: {value:?}"))
    })
}

fn bar_from_values(date: NaiveDate, values: [f64; 6], factor: Option<f64>) -> DailyBar {
    let [open, close, high, low, volume, amount] = values;
    DailyBar {
        date,
        open,
        close,
        high,
        low,
        volume,
        amount,
        factor,
    }
}

fn sort_and_dedup(mut rows: Vec<DailyBar>) -> Result<Vec<DailyBar>, DataError> {
    rows.sort_by_key(|b| b.date);

    let mut bars: Vec<DailyBar> = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;
    for bar in rows {
        if let Some(prev) = bars.last()
            && prev.date == bar.date
        {
            if !prev.same_values(&bar) {
                return Err(DataError::CorruptData(format!(
                    "Divergent duplicate date {}",
                    bar.date
                )));
            }
            dropped += 1;
            continue;
        }
        bars.push(bar);
    }

    if dropped > 0 {
        tracing::warn!("Dropped {} duplicate rows", dropped);
    }
    Ok(bars)
}

fn read_csv_rows(path: &Path) -> Result<(Vec<DailyBar>, bool), DataError> {
    let file = File::open(path)
        .map_err(|e| DataError::FileNotFound(path.display().to_string(), e.to_string()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| DataError::ParseError(e.to_string()))?
        .clone();
    let layout = ColumnLayout::from_labels(headers.iter())?;

    let mut bars = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DataError::ParseError(e.to_string()))?;
        let row = row_idx + 1;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let date = parse_date(cell(layout.date))
            .map_err(|e| DataError::ParseError(format!("row {row}: {e}")))?;
        let mut values = [f64::NAN; 6];
        for ((slot, &idx), &field) in values
            .iter_mut()
            .zip(layout.values.iter())
            .zip(Field::REQUIRED.iter())
        {
            *slot = parse_number(cell(idx), field, row)?;
        }
        let factor = layout
            .factor
            .map(|idx| parse_number(cell(idx), Field::Factor, row))
            .transpose()?;

        bars.push(bar_from_values(date, values, factor));
    }

    Ok((bars, layout.factor.is_some()))
}

fn read_parquet_rows(path: &Path) -> Result<(Vec<DailyBar>, bool), DataError> {
    let file = File::open(path)
        .map_err(|e| DataError::FileNotFound(path.display().to_string(), e.to_string()))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| DataError::ParseError(e.to_string()))?;
    let layout = ColumnLayout::from_labels(
        builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().as_str()),
    )?;
    let reader = builder
        .build()
        .map_err(|e| DataError::ParseError(e.to_string()))?;

    let mut bars = Vec::new();
    let mut processed_rows = 0usize;
    for batch_result in reader {
        let batch = batch_result.map_err(|e| DataError::ParseError(e.to_string()))?;

        let dates = DateAccessor::new(&batch, layout.date)?;
        let values = layout
            .values
            .iter()
            .map(|&idx| NumericAccessor::new(&batch, idx))
            .collect::<Result<Vec<_>, _>>()?;
        let factor = layout
            .factor
            .map(|idx| NumericAccessor::new(&batch, idx))
            .transpose()?;

        for row_idx in 0..batch.num_rows() {
            let date = dates
                .value(row_idx)
                .map_err(|e| DataError::ParseError(format!("row {}: {e}", processed_rows + row_idx + 1)))?;
            let mut cells = [f64::NAN; 6];
            for (slot, accessor) in cells.iter_mut().zip(&values) {
                *slot = accessor.value(row_idx);
            }
            bars.push(bar_from_values(
                date,
                cells,
                factor.as_ref().map(|a| a.value(row_idx)),
            ));
        }

        processed_rows += batch.num_rows();
    }

    Ok((bars, layout.factor.is_some()))
}

fn column_name(batch: &RecordBatch, idx: usize) -> String {
    batch.schema().field(idx).name().clone()
}

enum DateAccessor<'a> {
    Utf8(&'a StringArray),
    LargeUtf8(&'a LargeStringArray),
    Date32(&'a Date32Array),
}

impl<'a> DateAccessor<'a> {
    fn new(batch: &'a RecordBatch, idx: usize) -> Result<Self, DataError> {
        let col = batch.column(idx).as_any();
        if let Some(arr) = col.downcast_ref::<StringArray>() {
            Ok(DateAccessor::Utf8(arr))
        } else if let Some(arr) = col.downcast_ref::<LargeStringArray>() {
            Ok(DateAccessor::LargeUtf8(arr))
        } else if let Some(arr) = col.downcast_ref::<Date32Array>() {
            Ok(DateAccessor::Date32(arr))
        } else {
            Err(DataError::InvalidColumnType(column_name(batch, idx)))
        }
    }

    fn value(&self, idx: usize) -> Result<NaiveDate, DataError> {
        let is_null = match self {
            DateAccessor::Utf8(arr) => arr.is_null(idx),
            DateAccessor::LargeUtf8(arr) => arr.is_null(idx),
            DateAccessor::Date32(arr) => arr.is_null(idx),
        };
        if is_null {
            return Err(DataError::ParseError("Null date".to_string()));
        }

        match self {
            DateAccessor::Utf8(arr) => parse_date(arr.value(idx)),
            DateAccessor::LargeUtf8(arr) => parse_date(arr.value(idx)),
            DateAccessor::Date32(arr) => {
                let days = arr.value(idx);
                days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
                    .and_then(NaiveDate::from_num_days_from_ce_opt)
                    .ok_or_else(|| DataError::ParseError(format!("Invalid Date32 value: {days}")))
            }
        }
    }
}

enum NumericAccessor<'a> {
    F64(&'a Float64Array),
    F32(&'a Float32Array),
    I64(&'a Int64Array),
}

impl<'a> NumericAccessor<'a> {
    fn new(batch: &'a RecordBatch, idx: usize) -> Result<Self, DataError> {
        let col = batch.column(idx).as_any();
        if let Some(arr) = col.downcast_ref::<Float64Array>() {
            Ok(NumericAccessor::F64(arr))
        } else if let Some(arr) = col.downcast_ref::<Float32Array>() {
            Ok(NumericAccessor::F32(arr))
        } else if let Some(arr) = col.downcast_ref::<Int64Array>() {
            Ok(NumericAccessor::I64(arr))
        } else {
            Err(DataError::InvalidColumnType(column_name(batch, idx)))
        }
    }

    /// Nulls read as `NaN`.
    #[allow(clippy::cast_precision_loss)]
    fn value(&self, idx: usize) -> f64 {
        match self {
            NumericAccessor::F64(arr) if !arr.is_null(idx) => arr.value(idx),
            NumericAccessor::F32(arr) if !arr.is_null(idx) => f64::from(arr.value(idx)),
            NumericAccessor::I64(arr) if !arr.is_null(idx) => arr.value(idx) as f64,
            _ => f64::NAN,
        }
    }
}
