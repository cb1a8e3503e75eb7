//! CLI entry point for the qbin market-data store.
//!
//! Subcommands:
//!   - `convert`: Convert a directory of raw per-symbol files into the store
//!   - `verify`:  Read features back from the store and print them as TSV

use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use qbin_convert::run_conversion;
use qbin_data::{FeatureReader, resolve_source_dir, resolve_store_root};
use qbin_types::{ConvertConfig, ErrorResult, SymbolOutcome};

// ---------------------------------------------------------------------------
// CLI argument structs
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "qbin",
    version,
    about = "Convert daily market data into a columnar binary store",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert raw CSV/Parquet files into the store
    Convert(ConvertArgs),
    /// Query features from the store
    Verify(VerifyArgs),
}

#[derive(Parser)]
struct ConvertArgs {
    /// Directory of raw per-symbol files. Defaults to $QBIN_SOURCE_DIR or `data`
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Store root. Defaults to $QBIN_STORE_ROOT or `.qlib/qlib_data/cn_data`
    #[arg(long)]
    store_root: Option<PathBuf>,

    /// Print the full report as JSON instead of a summary
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser)]
struct VerifyArgs {
    /// Instruments, e.g. SH600001,SZ000002
    #[arg(long, value_delimiter = ',', required = true)]
    instruments: Vec<String>,

    /// Fields, e.g. '$close,$volume'
    #[arg(long, value_delimiter = ',', default_value = "$close")]
    fields: Vec<String>,

    /// First date (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Last date (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,

    /// Store root. Defaults to $QBIN_STORE_ROOT or `.qlib/qlib_data/cn_data`
    #[arg(long)]
    store_root: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("qbin=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Convert(args) => cmd_convert(args),
        Commands::Verify(args) => cmd_verify(args),
    }
}

fn cmd_convert(args: ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConvertConfig::new(
        args.source_dir.unwrap_or_else(resolve_source_dir),
        args.store_root.unwrap_or_else(resolve_store_root),
    );

    let report = match run_conversion(&config) {
        Ok(report) => report,
        Err(err) => {
            tracing::error!("Conversion failed: {err}");
            if args.json {
                let result = ErrorResult::from(err);
                println!("{}", serde_json::to_string(&result)?);
                return Err(result.message.into());
            }
            return Err(err.into());
        }
    };

    let mut out = std::io::stdout().lock();
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    for summary in &report.symbols {
        let symbol = summary.symbol.as_deref().unwrap_or("-");
        match &summary.outcome {
            SymbolOutcome::Converted {
                first_date,
                last_date,
                start_index,
                aligned_len,
                ..
            } => writeln!(
                out,
                "ok\t{symbol}\t{first_date}\t{last_date}\tstart={start_index}\tlen={aligned_len}"
            )?,
            SymbolOutcome::Skipped { stage, reason } => writeln!(
                out,
                "skip\t{symbol}\t{}\t{stage:?}\t{reason}",
                summary.source
            )?,
        }
    }
    writeln!(
        out,
        "{} files, {} converted, {} skipped, calendar {} dates, registry {} instruments",
        report.files_discovered,
        report.converted_count(),
        report.skipped_count(),
        report.calendar_len,
        report.registry_len
    )?;
    Ok(())
}

fn cmd_verify(args: VerifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let root = args.store_root.unwrap_or_else(resolve_store_root);
    let reader = FeatureReader::open(&root)?;
    let frame = reader.features(&args.instruments, &args.fields, args.start, args.end)?;

    let mut out = std::io::stdout().lock();
    writeln!(out, "datetime\tinstrument\t{}", frame.columns.join("\t"))?;
    for row in &frame.rows {
        let values: Vec<String> = row.values.iter().map(ToString::to_string).collect();
        writeln!(out, "{}\t{}\t{}", row.date, row.instrument, values.join("\t"))?;
    }
    tracing::info!("{} rows", frame.len());
    Ok(())
}
