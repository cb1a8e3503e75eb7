use crate::error::CoreError;

/// Exchange prefix of an instrument code.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// Shanghai
    Sh,
    /// Shenzhen
    Sz,
}

impl Market {
    /// Chooses the market from the leading digit of a raw code.
    /// `5`/`6` → Shanghai, `0`/`1` → Shenzhen, anything else falls back to Shanghai.
    #[must_use]
    pub fn for_code(code: &str) -> Self {
        match code.as_bytes().first() {
            Some(b'0' | b'1') => Market::Sz,
            _ => Market::Sh,
        }
    }

    /// Lowercase prefix (`sh` / `sz`).
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        match self {
            Market::Sh => "sh",
            Market::Sz => "sz",
        }
    }
}

/// Market-qualified instrument code, e.g. `sh600001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolCode {
    market: Market,
    code: String,
}

impl SymbolCode {
    /// Builds a code from a raw exchange code such as `600001`.
    ///
    /// # Errors
    /// [`CoreError::InvalidSymbol`] when the code is empty or not ASCII alphanumeric.
    pub fn from_raw(code: &str) -> Result<Self, CoreError> {
        let code = code.trim();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidSymbol(code.to_string()));
        }
        Ok(Self {
            market: Market::for_code(code),
            code: code.to_ascii_lowercase(),
        })
    }

    /// Parses an already-qualified code (`SH600001`, `sz000002`).
    ///
    /// # Errors
    /// [`CoreError::InvalidSymbol`] when the prefix is unknown or the remainder is invalid.
    pub fn parse_qualified(value: &str) -> Result<Self, CoreError> {
        let lower = value.trim().to_ascii_lowercase();
        let market = if lower.starts_with("sh") {
            Market::Sh
        } else if lower.starts_with("sz") {
            Market::Sz
        } else {
            return Err(CoreError::InvalidSymbol(value.to_string()));
        };
        let code = &lower[2..];
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidSymbol(value.to_string()));
        }
        Ok(Self {
            market,
            code: code.to_string(),
        })
    }

    /// Market of this instrument.
    #[must_use]
    pub fn market(&self) -> Market {
        self.market
    }

    /// Raw exchange code without prefix.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Lowercase form used for feature directories (`sh600001`).
    #[must_use]
    pub fn dir_name(&self) -> String {
        format!("{}{}", self.market.prefix(), self.code)
    }

    /// Uppercase form used as registry key (`SH600001`).
    #[must_use]
    pub fn registry_key(&self) -> String {
        self.dir_name().to_ascii_uppercase()
    }
}

impl std::fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.market.prefix(), self.code)
    }
}
