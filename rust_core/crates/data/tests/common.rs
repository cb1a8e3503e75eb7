#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_writer::ArrowWriter;

/// akshare-style header: 日期,开盘,收盘,最高,最低,成交量,成交额
pub const AKSHARE_HEADER: &str = "日期,开盘,收盘,最高,最低,成交量,成交额";

pub const ENGLISH_HEADER: &str = "date,open,close,high,low,volume,amount";

pub fn write_csv(dir: &Path, name: &str, header: &str, rows: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut contents = String::from(header);
    contents.push('\n');
    for row in rows {
        contents.push_str(row);
        contents.push('\n');
    }
    std::fs::write(&path, contents).unwrap();
    path
}

/// Row with every price equal to `price`, volume 100 and amount 1000.
pub fn flat_row(date: &str, price: f64) -> String {
    format!("{date},{price},{price},{price},{price},100,1000")
}

pub fn write_bar_parquet(
    path: &Path,
    dates: &[&str],
    closes: &[f64],
) -> Result<(), Box<dyn std::error::Error>> {
    let labels = ["date", "open", "close", "high", "low", "volume", "amount"];
    let mut fields = vec![Field::new(labels[0], DataType::Utf8, false)];
    fields.extend(
        labels[1..]
            .iter()
            .map(|l| Field::new(*l, DataType::Float64, true)),
    );

    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(dates.to_vec()))];
    for label in &labels[1..] {
        let values: Vec<f64> = match *label {
            "volume" => vec![100.0; closes.len()],
            "amount" => vec![1000.0; closes.len()],
            _ => closes.to_vec(),
        };
        columns.push(Arc::new(Float64Array::from(values)));
    }

    write_custom_parquet(path, fields, columns)
}

pub fn write_custom_parquet(
    path: &Path,
    fields: Vec<Field>,
    columns: Vec<ArrayRef>,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close().map(|_| ()).map_err(|e| e.into())
}
