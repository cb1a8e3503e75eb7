//! qbin Data
//!
//! Source ingestion, trading-calendar maintenance, calendar alignment, and the
//! binary feature store (encoder, registry, reader).

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(missing_docs)]

/// Per-symbol calendar alignment.
pub mod alignment;
/// Trading calendar load/merge/persist.
pub mod calendar;
/// Binary blob encoding.
pub mod encoder;
/// Data-layer error types.
pub mod error;
/// CSV/Parquet source discovery and parsing.
pub mod ingest;
/// Blob decoding and feature queries.
pub mod reader;
/// Instrument registry load/merge/persist.
pub mod registry;
/// On-disk store layout and path resolution.
pub mod store;
/// Bar sanity checks.
pub mod validation;

/// Re-export: calendar-aligned series.
pub use alignment::AlignedSeries;
/// Re-export: alignment stats.
pub use alignment::AlignmentStats;
/// Re-export: align raw bars to the calendar.
pub use alignment::align_series;
/// Re-export: trading calendar.
pub use calendar::TradingCalendar;
/// Re-export: per-symbol encode result.
pub use encoder::EncodedSymbol;
/// Re-export: encode one field blob.
pub use encoder::encode_field;
/// Re-export: encode every field of a symbol.
pub use encoder::write_symbol;
/// Re-export: data-layer error type.
pub use error::DataError;
/// Re-export: raw per-symbol series.
pub use ingest::RawSeries;
/// Re-export: list source files.
pub use ingest::discover_sources;
/// Re-export: parse one source file.
pub use ingest::ingest;
/// Re-export: feature query result.
pub use reader::FeatureFrame;
/// Re-export: feature query over a store.
pub use reader::FeatureReader;
/// Re-export: feature query row.
pub use reader::FeatureRow;
/// Re-export: decode a blob.
pub use reader::decode_blob;
/// Re-export: read and decode a blob file.
pub use reader::read_blob;
/// Re-export: instrument registry.
pub use registry::InstrumentRegistry;
/// Re-export: registry entry.
pub use registry::RegistryEntry;
/// Re-export: store layout.
pub use store::StoreLayout;
/// Re-export: resolve source directory.
pub use store::resolve_source_dir;
/// Re-export: resolve store root.
pub use store::resolve_store_root;
/// Re-export: bar validation.
pub use validation::validate_bars;
