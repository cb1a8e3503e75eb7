#![allow(dead_code)]

use std::path::{Path, PathBuf};

use qbin_types::{ConvertConfig, Field, SymbolCode};

pub const AKSHARE_HEADER: &str = "日期,开盘,收盘,最高,最低,成交量,成交额";

/// Source and store directories inside one temp dir.
pub struct Workspace {
    pub dir: tempfile::TempDir,
    pub source: PathBuf,
    pub store: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("raw");
        let store = dir.path().join("store");
        std::fs::create_dir(&source).unwrap();
        Self { dir, source, store }
    }

    pub fn config(&self) -> ConvertConfig {
        ConvertConfig::new(&self.source, &self.store)
    }

    pub fn config_json(&self) -> String {
        serde_json::json!({
            "source_dir": self.source,
            "store_root": self.store,
        })
        .to_string()
    }

    /// Writes `<name>` with akshare headers; rows are `(date, close)`, other
    /// prices equal close, volume 100, amount 1000.
    pub fn write_source(&self, name: &str, rows: &[(&str, f64)]) -> PathBuf {
        let mut contents = format!("{AKSHARE_HEADER}\n");
        for (date, close) in rows {
            contents.push_str(&format!("{date},{close},{close},{close},{close},100,1000\n"));
        }
        let path = self.source.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn write_raw(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.source.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn blob_path(&self, symbol: &str, field: Field) -> PathBuf {
        let symbol = SymbolCode::parse_qualified(symbol).unwrap();
        self.store
            .join("features")
            .join(symbol.dir_name())
            .join(format!("{}.day.bin", field.as_str()))
    }

    pub fn calendar_path(&self) -> PathBuf {
        self.store.join("calendars").join("day.txt")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.store.join("instruments").join("all.txt")
    }
}

/// Expected blob bytes: f32 LE start index followed by f32 LE values.
pub fn blob_bytes(start_index: u32, values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(4 * (values.len() + 1));
    bytes.extend_from_slice(&(start_index as f32).to_le_bytes());
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

pub fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}

pub fn read_text(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
