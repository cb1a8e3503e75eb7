//! Instrument registry (`instruments/all.txt`).

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;

use crate::calendar::DATE_FORMAT;
use crate::error::DataError;
use crate::store::write_text_atomic;

/// Date coverage of one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    /// First available date.
    pub first_date: NaiveDate,
    /// Last available date.
    pub last_date: NaiveDate,
}

/// Symbol → date coverage, keyed by uppercase symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl InstrumentRegistry {
    /// Loads a persisted registry. A missing file yields an empty registry.
    /// Lines with fewer than three tab-separated parts are skipped.
    ///
    /// # Errors
    /// - [`DataError::RegistryUnreadable`] when the file exists but cannot be read.
    /// - [`DataError::CorruptData`] for unparsable or inverted date ranges.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(DataError::RegistryUnreadable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let mut entries = BTreeMap::new();
        for (line_no, line) in contents.lines().enumerate() {
            let parts: Vec<&str> = line.trim().split('\t').collect();
            if parts.len() < 3 {
                if !line.trim().is_empty() {
                    tracing::warn!("Skipping malformed registry line {}: {:?}", line_no + 1, line);
                }
                continue;
            }

            let parse = |value: &str| {
                NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
                    DataError::CorruptData(format!(
                        "Invalid registry date at line {}: {value} ({e})",
                        line_no + 1
                    ))
                })
            };
            let entry = RegistryEntry {
                first_date: parse(parts[1])?,
                last_date: parse(parts[2])?,
            };
            if entry.first_date > entry.last_date {
                return Err(DataError::CorruptData(format!(
                    "Inverted registry range at line {}: {} > {}",
                    line_no + 1,
                    entry.first_date,
                    entry.last_date
                )));
            }
            entries.insert(parts[0].trim().to_ascii_uppercase(), entry);
        }

        Ok(Self { entries })
    }

    /// Returns a registry where each observation replaces any prior entry for
    /// the same (case-insensitive) symbol. Ranges are not unioned.
    #[must_use]
    pub fn merge<K: AsRef<str>>(
        &self,
        observations: impl IntoIterator<Item = (K, RegistryEntry)>,
    ) -> Self {
        let mut entries = self.entries.clone();
        for (symbol, entry) in observations {
            entries.insert(symbol.as_ref().trim().to_ascii_uppercase(), entry);
        }
        Self { entries }
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&RegistryEntry> {
        self.entries.get(&symbol.trim().to_ascii_uppercase())
    }

    /// Entries sorted by symbol.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegistryEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of instruments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no instruments are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes `SYMBOL\tfirst\tlast` lines sorted by symbol.
    ///
    /// # Errors
    /// [`DataError::WriteFailed`] when the file cannot be written.
    pub fn persist(&self, path: &Path) -> Result<(), DataError> {
        let mut out = String::new();
        for (symbol, entry) in &self.entries {
            let _ = writeln!(
                out,
                "{symbol}\t{}\t{}",
                entry.first_date.format(DATE_FORMAT),
                entry.last_date.format(DATE_FORMAT)
            );
        }
        write_text_atomic(path, &out)
    }
}
