//! qbin Convert
//!
//! Drives a conversion run: discovers raw per-symbol files, merges the
//! trading calendar, aligns and encodes each symbol, and updates the
//! instrument registry.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(missing_docs)]

pub mod driver;
pub mod error;
pub mod runner;

pub use driver::{ConversionStage, Converter};
pub use error::ConvertError;
pub use runner::{run_conversion, run_conversion_from_json, validate_config};
