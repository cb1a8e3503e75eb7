/// Feature field stored per symbol.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Opening price
    Open,
    /// Closing price
    Close,
    /// Daily high
    High,
    /// Daily low
    Low,
    /// Traded volume
    Volume,
    /// Traded amount (turnover)
    Amount,
    /// Adjustment factor (1.0 when the source carries none)
    Factor,
}

impl Field {
    /// Fields every symbol directory must contain, in write order.
    pub const ALL: [Field; 7] = [
        Field::Open,
        Field::Close,
        Field::High,
        Field::Low,
        Field::Volume,
        Field::Amount,
        Field::Factor,
    ];

    /// Fields that must be present in every raw source file.
    pub const REQUIRED: [Field; 6] = [
        Field::Open,
        Field::Close,
        Field::High,
        Field::Low,
        Field::Volume,
        Field::Amount,
    ];

    /// Lowercase name used in blob file names.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Open => "open",
            Field::Close => "close",
            Field::High => "high",
            Field::Low => "low",
            Field::Volume => "volume",
            Field::Amount => "amount",
            Field::Factor => "factor",
        }
    }

    /// Position of this field in [`Field::ALL`].
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            Field::Open => 0,
            Field::Close => 1,
            Field::High => 2,
            Field::Low => 3,
            Field::Volume => 4,
            Field::Amount => 5,
            Field::Factor => 6,
        }
    }

    /// `$`-prefixed name used by the query interface.
    #[must_use]
    pub fn query_name(&self) -> String {
        format!("${}", self.as_str())
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFieldError(pub String);

impl std::fmt::Display for ParseFieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid field name: {}", self.0)
    }
}

impl std::error::Error for ParseFieldError {}

impl std::str::FromStr for Field {
    type Err = ParseFieldError;

    /// Accepts both `close` and `$close`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix('$').unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "open" => Ok(Field::Open),
            "close" => Ok(Field::Close),
            "high" => Ok(Field::High),
            "low" => Ok(Field::Low),
            "volume" => Ok(Field::Volume),
            "amount" => Ok(Field::Amount),
            "factor" => Ok(Field::Factor),
            _ => Err(ParseFieldError(s.to_string())),
        }
    }
}
