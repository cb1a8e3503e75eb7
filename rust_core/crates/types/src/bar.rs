use chrono::NaiveDate;

use crate::field::Field;

/// One daily row of a raw per-symbol series.
/// Missing cells are `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DailyBar {
    /// Trading date
    pub date: NaiveDate,
    /// Open price
    pub open: f64,
    /// Close price
    pub close: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Volume
    pub volume: f64,
    /// Turnover
    pub amount: f64,
    /// Adjustment factor, `None` when the source has no factor column
    #[serde(default)]
    pub factor: Option<f64>,
}

impl DailyBar {
    /// Value for a field. `Factor` defaults to 1.0.
    #[must_use]
    pub fn value(&self, field: Field) -> f64 {
        match field {
            Field::Open => self.open,
            Field::Close => self.close,
            Field::High => self.high,
            Field::Low => self.low,
            Field::Volume => self.volume,
            Field::Amount => self.amount,
            Field::Factor => self.factor.unwrap_or(1.0),
        }
    }

    /// Bitwise comparison so that two all-`NaN` rows count as identical.
    #[must_use]
    pub fn same_values(&self, other: &DailyBar) -> bool {
        Field::ALL
            .iter()
            .all(|&f| self.value(f).to_bits() == other.value(f).to_bits())
            && self.factor.is_some() == other.factor.is_some()
    }
}
