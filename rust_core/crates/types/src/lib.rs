//! qbin Types
//!
//! Core value types for the qbin market-data store.
//! This crate provides daily bars, feature fields, market-qualified symbol
//! codes, conversion configuration, and run reports.

#![deny(clippy::all)]

pub mod bar;
pub mod config;
pub mod error;
pub mod field;
pub mod result;
pub mod symbol;

// Re-export main types for convenience
pub use bar::DailyBar;
pub use config::{ConvertConfig, DAY_FREQ};
pub use error::CoreError;
pub use field::{Field, ParseFieldError};
pub use result::{ConversionReport, ErrorResult, SkipStage, SymbolOutcome, SymbolSummary};
pub use symbol::{Market, SymbolCode};
