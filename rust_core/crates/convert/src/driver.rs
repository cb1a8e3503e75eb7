//! Conversion driver.
//!
//! One run walks `Discover → Ingest → CalendarMerge → Align → Encode →
//! RegistryMerge → Done`. The calendar is fixed before any symbol is aligned,
//! and per-symbol failures are recorded in the report instead of aborting.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use qbin_data::{
    AlignedSeries, InstrumentRegistry, RawSeries, RegistryEntry, StoreLayout, TradingCalendar,
    align_series, discover_sources, ingest, write_symbol,
};
use qbin_types::{ConversionReport, ConvertConfig, SkipStage, SymbolOutcome, SymbolSummary};

use crate::error::ConvertError;

/// Pipeline stage of a conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConversionStage {
    /// Listing source files
    Discover,
    /// Parsing source files
    Ingest,
    /// Merging observed dates into the calendar
    CalendarMerge,
    /// Reindexing symbols onto the calendar
    Align,
    /// Writing feature blobs
    Encode,
    /// Updating the instrument registry
    RegistryMerge,
    /// Run finished
    Done,
}

impl ConversionStage {
    /// Stage name as used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionStage::Discover => "discover",
            ConversionStage::Ingest => "ingest",
            ConversionStage::CalendarMerge => "calendar_merge",
            ConversionStage::Align => "align",
            ConversionStage::Encode => "encode",
            ConversionStage::RegistryMerge => "registry_merge",
            ConversionStage::Done => "done",
        }
    }
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A symbol still in the pipeline, tied to its report slot.
struct Pending<T> {
    slot: usize,
    value: T,
}

/// Single-pass converter from a source directory into a store.
#[derive(Debug)]
pub struct Converter {
    source_dir: PathBuf,
    layout: StoreLayout,
    stage: ConversionStage,
}

impl Converter {
    /// Creates a converter for a validated config.
    #[must_use]
    pub fn new(config: &ConvertConfig) -> Self {
        Self {
            source_dir: config.source_dir.clone(),
            layout: StoreLayout::new(&config.store_root),
            stage: ConversionStage::Discover,
        }
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> ConversionStage {
        self.stage
    }

    /// Store layout written by this converter.
    #[must_use]
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Source directory read by this converter.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    fn advance(&mut self, next: ConversionStage) {
        tracing::debug!("Stage {} -> {}", self.stage, next);
        self.stage = next;
    }

    /// Runs the full conversion.
    ///
    /// The existing calendar and registry are read before anything is written;
    /// an unreadable one aborts the run with the store untouched.
    ///
    /// # Errors
    /// - [`ConvertError::Data`] for unreadable store files, an unlistable
    ///   source directory, or a failed calendar/registry write.
    pub fn run(&mut self) -> Result<ConversionReport, ConvertError> {
        let calendar = TradingCalendar::load(&self.layout.calendar_path())?;
        let registry = InstrumentRegistry::load(&self.layout.registry_path())?;

        let mut report = ConversionReport {
            calendar_len: calendar.len(),
            registry_len: registry.len(),
            ..ConversionReport::default()
        };

        self.advance(ConversionStage::Discover);
        let files = discover_sources(&self.source_dir)?;
        report.files_discovered = files.len();
        if files.is_empty() {
            tracing::info!(
                "No source files found in {}, nothing to convert",
                self.source_dir.display()
            );
            self.advance(ConversionStage::Done);
            return Ok(report);
        }
        tracing::info!(
            "Converting {} source files from {}",
            files.len(),
            self.source_dir.display()
        );

        self.advance(ConversionStage::Ingest);
        let mut slots: Vec<Option<SymbolSummary>> = vec![None; files.len()];
        let mut sources: Vec<String> = Vec::with_capacity(files.len());
        let mut ingested: Vec<Pending<RawSeries>> = Vec::new();
        let mut seen = HashSet::new();
        for (slot, path) in files.iter().enumerate() {
            let source = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            sources.push(source.clone());

            match ingest(path) {
                Ok(raw) => {
                    if seen.insert(raw.symbol.clone()) {
                        tracing::debug!("{}: {} rows from {}", raw.symbol, raw.len(), source);
                        ingested.push(Pending { slot, value: raw });
                    } else {
                        let symbol = raw.symbol.to_string();
                        tracing::warn!("{}: duplicate of {}, skipping", source, symbol);
                        slots[slot] = Some(skipped(
                            source,
                            Some(symbol.clone()),
                            SkipStage::Duplicate,
                            format!("symbol {symbol} already supplied by an earlier file"),
                        ));
                    }
                }
                Err(err) => {
                    tracing::warn!("{}: ingest failed: {}", source, err);
                    let symbol = qbin_data::ingest::symbol_from_path(path)
                        .ok()
                        .map(|s| s.to_string());
                    slots[slot] = Some(skipped(source, symbol, SkipStage::Ingest, err.to_string()));
                }
            }
        }

        if ingested.is_empty() {
            tracing::warn!("No source file could be ingested; store left unchanged");
            self.advance(ConversionStage::Done);
            report.symbols = slots.into_iter().flatten().collect();
            return Ok(report);
        }

        self.advance(ConversionStage::CalendarMerge);
        let previous = calendar;
        let calendar = previous.merge(ingested.iter().flat_map(|p| p.value.dates()));
        let shifted_from = calendar.first_shifted_date(&previous);
        if let Some(date) = shifted_from {
            tracing::warn!(
                "Calendar backfill moves indices from {} onward; blobs not rewritten by this run are misaligned",
                date
            );
        }
        calendar.persist(&self.layout.calendar_path())?;
        report.calendar_shifted_from = shifted_from;
        report.calendar_len = calendar.len();
        report.calendar_persisted = true;
        tracing::info!("Calendar merged: {} trading dates", calendar.len());

        self.advance(ConversionStage::Align);
        let mut aligned: Vec<Pending<AlignedSeries>> = Vec::with_capacity(ingested.len());
        for Pending { slot, value: raw } in ingested {
            match align_series(&raw, &calendar) {
                Ok(series) => aligned.push(Pending { slot, value: series }),
                Err(err) => {
                    tracing::warn!("{}: alignment failed: {}", raw.symbol, err);
                    slots[slot] = Some(skipped(
                        sources[slot].clone(),
                        Some(raw.symbol.to_string()),
                        SkipStage::Align,
                        err.to_string(),
                    ));
                }
            }
        }

        self.advance(ConversionStage::Encode);
        let mut observations: Vec<(String, RegistryEntry)> = Vec::with_capacity(aligned.len());
        for Pending { slot, value: series } in aligned {
            let source = sources[slot].clone();
            let symbol = series.symbol.to_string();
            match write_symbol(&self.layout, &series) {
                Ok(encoded) => {
                    tracing::info!(
                        "{}: {} values from index {} ({} gaps filled)",
                        symbol,
                        series.len(),
                        series.start_index,
                        series.stats.filled_gaps
                    );
                    observations.push((
                        series.symbol.registry_key(),
                        RegistryEntry {
                            first_date: series.first_date,
                            last_date: series.last_date,
                        },
                    ));
                    slots[slot] = Some(SymbolSummary {
                        source,
                        symbol: Some(symbol),
                        outcome: SymbolOutcome::Converted {
                            first_date: series.first_date,
                            last_date: series.last_date,
                            start_index: series.start_index,
                            aligned_len: series.len(),
                            filled_gaps: series.stats.filled_gaps,
                            bytes_written: encoded.bytes_written(),
                        },
                    });
                }
                Err(err) => {
                    tracing::warn!("{}: encoding failed: {}", symbol, err);
                    slots[slot] = Some(skipped(source, Some(symbol), SkipStage::Encode, err.to_string()));
                }
            }
        }

        self.advance(ConversionStage::RegistryMerge);
        if let Some(shifted) = shifted_from {
            let rewritten: HashSet<&str> = observations.iter().map(|(k, _)| k.as_str()).collect();
            report.stale_symbols = registry
                .iter()
                .filter(|(symbol, entry)| entry.last_date >= shifted && !rewritten.contains(symbol))
                .map(|(symbol, _)| symbol.to_string())
                .collect();
            if !report.stale_symbols.is_empty() {
                tracing::warn!(
                    "{} registered symbols still index the previous calendar, re-convert them: {}",
                    report.stale_symbols.len(),
                    report.stale_symbols.join(", ")
                );
            }
            if observations.is_empty() {
                tracing::warn!("Shifted calendar persisted although no symbol was converted");
            }
        }
        let registry = registry.merge(observations.iter().map(|(k, e)| (k.as_str(), *e)));
        report.registry_len = registry.len();
        if observations.is_empty() {
            tracing::warn!("No symbol fully encoded; registry left unchanged");
        } else {
            registry.persist(&self.layout.registry_path())?;
            report.registry_persisted = true;
        }

        self.advance(ConversionStage::Done);
        report.symbols = slots.into_iter().flatten().collect();
        tracing::info!(
            "Conversion done: {} converted, {} skipped",
            report.converted_count(),
            report.skipped_count()
        );
        Ok(report)
    }
}

fn skipped(source: String, symbol: Option<String>, stage: SkipStage, reason: String) -> SymbolSummary {
    SymbolSummary {
        source,
        symbol,
        outcome: SymbolOutcome::Skipped { stage, reason },
    }
}
