//! Integration tests for the conversion driver.
//!
//! Tests cover:
//! - Config validation and JSON entry point
//! - Exact blob, calendar, and registry output
//! - Incremental runs against an existing store
//! - Per-file skips (malformed, duplicate symbol)
//! - Fatal store errors before any write

use chrono::NaiveDate;
use qbin_convert::{ConvertError, run_conversion, run_conversion_from_json};
use qbin_data::{FeatureReader, read_blob, resolve_store_root};
use qbin_types::{ConversionReport, ConvertConfig, Field, SkipStage, SymbolOutcome};
use temp_env::with_var;

mod common;
use common::{Workspace, blob_bytes, read, read_text};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn two_symbol_workspace() -> Workspace {
    let ws = Workspace::new();
    ws.write_source(
        "600001.csv",
        &[("2024-01-02", 10.0), ("2024-01-03", 10.5), ("2024-01-04", 11.0)],
    );
    ws.write_source(
        "000002.csv",
        &[("2024-01-03", 20.0), ("2024-01-04", 19.5), ("2024-01-05", 19.0)],
    );
    ws
}

fn skip_stage(report: &ConversionReport, source: &str) -> Option<SkipStage> {
    report
        .symbols
        .iter()
        .find(|s| s.source == source)
        .and_then(|s| match s.outcome {
            SymbolOutcome::Skipped { stage, .. } => Some(stage),
            SymbolOutcome::Converted { .. } => None,
        })
}

// ============================================================================
// CONFIG VALIDATION TESTS
// ============================================================================

#[test]
fn test_config_parse_error() {
    let err = run_conversion_from_json("{not json").unwrap_err();
    assert!(matches!(err, ConvertError::ConfigParse(_)));
    assert_eq!(err.error_category(), "config");
}

#[test]
fn test_config_validation_unsupported_freq() {
    let ws = Workspace::new();
    let config = serde_json::json!({
        "source_dir": ws.source,
        "store_root": ws.store,
        "freq": "1min",
    })
    .to_string();

    let err = run_conversion_from_json(&config).unwrap_err();
    assert!(
        matches!(err, ConvertError::ConfigValidation(ref msg) if msg.contains("freq")),
        "Expected freq error, got: {:?}",
        err
    );
}

#[test]
fn test_config_validation_missing_source_dir_writes_nothing() {
    let ws = Workspace::new();
    let config = ConvertConfig::new(ws.dir.path().join("absent"), &ws.store);

    let err = run_conversion(&config).unwrap_err();
    assert!(err.is_config_error());
    assert!(!ws.store.exists());
}

// ============================================================================
// OUTPUT FORMAT TESTS
// ============================================================================

#[test]
fn test_two_symbols_exact_store_contents() {
    let ws = two_symbol_workspace();

    let report = run_conversion(&ws.config()).unwrap();
    assert_eq!(report.files_discovered, 2);
    assert_eq!(report.converted_count(), 2);
    assert_eq!(report.calendar_len, 4);
    assert!(report.calendar_persisted);
    assert!(report.registry_persisted);

    assert_eq!(
        read_text(&ws.calendar_path()),
        "2024-01-02\n2024-01-03\n2024-01-04\n2024-01-05\n"
    );
    assert_eq!(
        read(&ws.blob_path("SH600001", Field::Close)),
        blob_bytes(0, &[10.0, 10.5, 11.0])
    );
    assert_eq!(
        read(&ws.blob_path("SZ000002", Field::Close)),
        blob_bytes(1, &[20.0, 19.5, 19.0])
    );
    assert_eq!(
        read_text(&ws.registry_path()),
        "SH600001\t2024-01-02\t2024-01-04\nSZ000002\t2024-01-03\t2024-01-05\n"
    );
}

#[test]
fn test_every_field_blob_written() {
    let ws = two_symbol_workspace();
    run_conversion(&ws.config()).unwrap();

    for field in Field::ALL {
        let blob = read_blob(&ws.blob_path("SZ000002", field)).unwrap();
        assert_eq!(blob.start_index, 1, "{field}");
        assert_eq!(blob.values.len(), 3, "{field}");
    }
    let volume = read_blob(&ws.blob_path("SH600001", Field::Volume)).unwrap();
    assert_eq!(volume.values, vec![100.0; 3]);
}

#[test]
fn test_missing_factor_column_writes_ones() {
    let ws = two_symbol_workspace();
    run_conversion(&ws.config()).unwrap();

    assert_eq!(
        read(&ws.blob_path("SH600001", Field::Factor)),
        blob_bytes(0, &[1.0, 1.0, 1.0])
    );
}

#[test]
fn test_single_row_file() {
    let ws = two_symbol_workspace();
    ws.write_source("510300.csv", &[("2024-01-04", 3.9)]);

    let report = run_conversion(&ws.config()).unwrap();
    assert_eq!(report.converted_count(), 3);
    assert_eq!(
        read(&ws.blob_path("SH510300", Field::Close)),
        blob_bytes(2, &[3.9])
    );
}

#[test]
fn test_interior_gap_filled_with_nan() {
    let ws = Workspace::new();
    ws.write_source("600001.csv", &[("2024-01-02", 1.0), ("2024-01-04", 3.0)]);
    ws.write_source("600002.csv", &[("2024-01-03", 2.0)]);

    let report = run_conversion(&ws.config()).unwrap();
    let Some(SymbolOutcome::Converted { aligned_len, filled_gaps, .. }) =
        report.summary("sh600001").map(|s| s.outcome.clone())
    else {
        panic!("sh600001 not converted");
    };
    assert_eq!(aligned_len, 3);
    assert_eq!(filled_gaps, 1);

    let close = read_blob(&ws.blob_path("SH600001", Field::Close)).unwrap();
    assert_eq!(close.values[0], 1.0);
    assert!(close.values[1].is_nan());
    assert_eq!(close.values[2], 3.0);
}

#[test]
fn test_json_entry_point_returns_report() {
    let ws = two_symbol_workspace();

    let json = run_conversion_from_json(&ws.config_json()).unwrap();
    let report: ConversionReport = serde_json::from_str(&json).unwrap();
    assert_eq!(report.converted_count(), 2);
    assert!(json.contains("\"status\":\"converted\""));
}

#[test]
fn test_store_readable_through_feature_reader() {
    let ws = two_symbol_workspace();
    run_conversion(&ws.config()).unwrap();

    let reader = FeatureReader::open(&ws.store).unwrap();
    let frame = reader
        .features(&["SH600001", "SZ000002"], &["$close"], d("2024-01-01"), d("2024-01-31"))
        .unwrap();
    assert_eq!(frame.len(), 6);
    assert_eq!(frame.value(d("2024-01-04"), "SH600001", "$close"), Some(11.0));
    assert_eq!(frame.value(d("2024-01-05"), "SZ000002", "$close"), Some(19.0));
}

// ============================================================================
// INCREMENTAL RUN TESTS
// ============================================================================

#[test]
fn test_second_run_extends_calendar_without_shifting_indices() {
    let ws = two_symbol_workspace();
    run_conversion(&ws.config()).unwrap();
    let first_calendar = read_text(&ws.calendar_path());

    std::fs::remove_file(ws.source.join("600001.csv")).unwrap();
    std::fs::remove_file(ws.source.join("000002.csv")).unwrap();
    ws.write_source("600003.csv", &[("2024-01-05", 7.0), ("2024-01-08", 7.5)]);

    let report = run_conversion(&ws.config()).unwrap();
    assert_eq!(report.calendar_len, 5);
    assert_eq!(report.registry_len, 3);

    let calendar = read_text(&ws.calendar_path());
    assert!(calendar.starts_with(&first_calendar));
    assert!(calendar.ends_with("2024-01-08\n"));

    assert_eq!(
        read(&ws.blob_path("SH600001", Field::Close)),
        blob_bytes(0, &[10.0, 10.5, 11.0])
    );
    assert_eq!(
        read(&ws.blob_path("SH600003", Field::Close)),
        blob_bytes(3, &[7.0, 7.5])
    );
    assert!(read_text(&ws.registry_path()).contains("SH600001\t2024-01-02\t2024-01-04\n"));
    assert!(report.calendar_shifted_from.is_none());
    assert!(report.stale_symbols.is_empty());
}

#[test]
fn test_reconversion_replaces_registry_range() {
    let ws = two_symbol_workspace();
    run_conversion(&ws.config()).unwrap();

    ws.write_source("600001.csv", &[("2024-01-05", 12.0)]);
    run_conversion(&ws.config()).unwrap();

    let registry = read_text(&ws.registry_path());
    assert!(registry.contains("SH600001\t2024-01-05\t2024-01-05\n"));
    assert_eq!(
        read(&ws.blob_path("SH600001", Field::Close)),
        blob_bytes(3, &[12.0])
    );
}

#[test]
fn test_backfill_reports_symbols_left_on_previous_calendar() {
    let ws = Workspace::new();
    ws.write_source("600001.csv", &[("2024-01-03", 10.0), ("2024-01-04", 11.0)]);
    let first = run_conversion(&ws.config()).unwrap();
    assert!(first.calendar_shifted_from.is_none());

    std::fs::remove_file(ws.source.join("600001.csv")).unwrap();
    ws.write_source("000002.csv", &[("2024-01-02", 20.0)]);

    let report = run_conversion(&ws.config()).unwrap();
    assert_eq!(report.converted_count(), 1);
    assert_eq!(report.calendar_shifted_from, Some(d("2024-01-03")));
    assert_eq!(report.stale_symbols, vec!["SH600001".to_string()]);
    assert_eq!(
        read_text(&ws.calendar_path()),
        "2024-01-02\n2024-01-03\n2024-01-04\n"
    );

    // The untouched blob still carries its first-run start index.
    assert_eq!(
        read(&ws.blob_path("SH600001", Field::Close)),
        blob_bytes(0, &[10.0, 11.0])
    );
    assert_eq!(
        read(&ws.blob_path("SZ000002", Field::Close)),
        blob_bytes(0, &[20.0])
    );
}

#[test]
fn test_backfill_of_rewritten_symbol_is_not_stale() {
    let ws = Workspace::new();
    ws.write_source("600001.csv", &[("2024-01-03", 10.0), ("2024-01-04", 11.0)]);
    run_conversion(&ws.config()).unwrap();

    ws.write_source(
        "600001.csv",
        &[("2024-01-02", 9.5), ("2024-01-03", 10.0), ("2024-01-04", 11.0)],
    );
    let report = run_conversion(&ws.config()).unwrap();
    assert_eq!(report.calendar_shifted_from, Some(d("2024-01-03")));
    assert!(report.stale_symbols.is_empty());
    assert_eq!(
        read(&ws.blob_path("SH600001", Field::Close)),
        blob_bytes(0, &[9.5, 10.0, 11.0])
    );
}

// ============================================================================
// SKIP / FAILURE TESTS
// ============================================================================

#[test]
fn test_malformed_file_skipped_others_converted() {
    let ws = two_symbol_workspace();
    ws.write_raw("600009.csv", "日期,开盘,收盘\n2024-01-02,1,1\n");
    ws.write_raw("600010.csv", "date,open,close,high,low,volume,amount\nbogus,1,1,1,1,1,1\n");

    let report = run_conversion(&ws.config()).unwrap();
    assert_eq!(report.files_discovered, 4);
    assert_eq!(report.converted_count(), 2);
    assert_eq!(skip_stage(&report, "600009.csv"), Some(SkipStage::Ingest));
    assert_eq!(skip_stage(&report, "600010.csv"), Some(SkipStage::Ingest));
    assert!(!ws.blob_path("SH600009", Field::Close).exists());
    assert!(!read_text(&ws.registry_path()).contains("SH600009"));
}

#[test]
fn test_duplicate_symbol_second_file_skipped() {
    let ws = Workspace::new();
    ws.write_source("600001.csv", &[("2024-01-02", 1.0)]);
    ws.write_source("600001_copy.csv", &[("2024-01-03", 2.0)]);

    let report = run_conversion(&ws.config()).unwrap();
    assert_eq!(report.converted_count(), 1);
    assert_eq!(skip_stage(&report, "600001_copy.csv"), Some(SkipStage::Duplicate));
    assert_eq!(report.calendar_len, 1);
    assert_eq!(
        read(&ws.blob_path("SH600001", Field::Close)),
        blob_bytes(0, &[1.0])
    );
}

#[test]
fn test_encode_failure_skips_only_that_symbol() {
    let ws = two_symbol_workspace();
    std::fs::create_dir_all(ws.store.join("features")).unwrap();
    std::fs::write(ws.store.join("features").join("sh600001"), "").unwrap();

    let report = run_conversion(&ws.config()).unwrap();
    assert_eq!(report.converted_count(), 1);
    assert_eq!(skip_stage(&report, "600001.csv"), Some(SkipStage::Encode));
    assert_eq!(skip_stage(&report, "000002.csv"), None);
    assert_eq!(
        read(&ws.blob_path("SZ000002", Field::Close)),
        blob_bytes(1, &[20.0, 19.5, 19.0])
    );
    assert_eq!(
        read_text(&ws.registry_path()),
        "SZ000002\t2024-01-03\t2024-01-05\n"
    );
}

#[test]
fn test_no_source_files_persists_nothing() {
    let ws = Workspace::new();
    ws.write_raw("README.txt", "not a source");

    let report = run_conversion(&ws.config()).unwrap();
    assert_eq!(report.files_discovered, 0);
    assert!(!report.calendar_persisted);
    assert!(!report.registry_persisted);
    assert!(!ws.calendar_path().exists());
    assert!(!ws.registry_path().exists());
}

#[test]
fn test_all_files_malformed_persists_nothing() {
    let ws = Workspace::new();
    ws.write_raw("600001.csv", "foo,bar\n1,2\n");

    let report = run_conversion(&ws.config()).unwrap();
    assert_eq!(report.skipped_count(), 1);
    assert!(!ws.calendar_path().exists());
    assert!(!ws.registry_path().exists());
}

#[test]
fn test_unreadable_calendar_is_fatal_before_writes() {
    let ws = two_symbol_workspace();
    // A directory where the calendar file should be cannot be read as text.
    std::fs::create_dir_all(ws.calendar_path()).unwrap();

    let err = run_conversion(&ws.config()).unwrap_err();
    assert_eq!(err.error_category(), "store");
    assert!(!ws.store.join("features").exists());
    assert!(!ws.registry_path().exists());
}

#[test]
fn test_corrupt_calendar_is_fatal() {
    let ws = two_symbol_workspace();
    std::fs::create_dir_all(ws.calendar_path().parent().unwrap()).unwrap();
    std::fs::write(ws.calendar_path(), "2024-01-03\n2024-01-02\n").unwrap();

    let err = run_conversion(&ws.config()).unwrap_err();
    assert!(matches!(err, ConvertError::Data(_)));
    assert!(!ws.store.join("features").exists());
}

#[test]
fn test_store_root_env_override() {
    let ws = two_symbol_workspace();
    let root = ws.store.to_string_lossy().to_string();

    with_var("QBIN_STORE_ROOT", Some(root.as_str()), || {
        let config = ConvertConfig::new(&ws.source, resolve_store_root());
        run_conversion(&config).unwrap();
    });
    assert!(ws.calendar_path().exists());
}
