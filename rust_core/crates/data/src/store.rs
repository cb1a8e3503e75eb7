//! On-disk layout of the binary store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use qbin_types::{DAY_FREQ, Field, SymbolCode};

use crate::error::DataError;

/// Default store root when `QBIN_STORE_ROOT` is unset.
pub const DEFAULT_STORE_ROOT: &str = ".qlib/qlib_data/cn_data";
/// Default raw source directory when `QBIN_SOURCE_DIR` is unset.
pub const DEFAULT_SOURCE_DIR: &str = "data";

/// Resolve the store root using the canonical default or an env override.
pub fn resolve_store_root() -> PathBuf {
    std::env::var("QBIN_STORE_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_ROOT))
}

/// Resolve the raw source directory using the canonical default or an env override.
pub fn resolve_source_dir() -> PathBuf {
    std::env::var("QBIN_SOURCE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOURCE_DIR))
}

/// Paths of the calendar, registry, and feature blobs under one store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    /// Creates a layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/calendars/day.txt`
    #[must_use]
    pub fn calendar_path(&self) -> PathBuf {
        self.root.join("calendars").join(format!("{DAY_FREQ}.txt"))
    }

    /// `<root>/instruments/all.txt`
    #[must_use]
    pub fn registry_path(&self) -> PathBuf {
        self.root.join("instruments").join("all.txt")
    }

    /// `<root>/features/<symbol>`, symbol lowercase.
    #[must_use]
    pub fn feature_dir(&self, symbol: &SymbolCode) -> PathBuf {
        self.root.join("features").join(symbol.dir_name())
    }

    /// `<root>/features/<symbol>/<field>.day.bin`
    #[must_use]
    pub fn feature_path(&self, symbol: &SymbolCode, field: Field) -> PathBuf {
        self.feature_dir(symbol)
            .join(format!("{}.{DAY_FREQ}.bin", field.as_str()))
    }
}

/// Writes `contents` to a sibling temp file and renames it over `path`,
/// creating parent directories as needed.
pub(crate) fn write_text_atomic(path: &Path, contents: &str) -> Result<(), DataError> {
    let write_failed = |e: std::io::Error| DataError::WriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_failed)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = fs::File::create(&tmp).map_err(write_failed)?;
    file.write_all(contents.as_bytes()).map_err(write_failed)?;
    file.sync_all().map_err(write_failed)?;
    drop(file);

    fs::rename(&tmp, path).map_err(write_failed)
}
