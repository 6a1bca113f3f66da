//! CLI entry point for the dataset cleaning pipeline.

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use scrubber_processing::codec::{decode_table, encode_table};
use scrubber_processing::job::{DEFAULT_DESTINATION_BUCKET, DEFAULT_SOURCE_BUCKET, JobRunner};
use scrubber_processing::{CleaningOptions, FillValue, LocalStore, Pipeline, PipelineOutput};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the default store root for `job`.
const STORE_ROOT_ENV: &str = "SCRUBBER_STORE_ROOT";

#[derive(Parser, Debug)]
#[command(
    author = "Scrubber Team",
    version,
    about = "Tabular dataset cleaning pipeline",
    long_about = "Cleans CSV datasets: duplicate removal, column pruning, missing value \
                  handling and DBSCAN anomaly flagging.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  SCRUBBER_STORE_ROOT   Default store root for the job command\n  \
                  RUST_LOG              Log filter (overrides --log-level)\n\n\
                  EXAMPLES:\n  \
                  # Remove duplicates and fill gaps with column medians\n  \
                  scrubber clean -i data.csv -o clean.csv --drop-duplicates --fill-na fill --fill-na-value median\n\n  \
                  # Flag anomalies and print the report as JSON\n  \
                  scrubber clean -i data.csv -o clean.csv --anomaly-detection --json\n\n  \
                  # Run a job event against a local store\n  \
                  scrubber job --event event.json --store-root ./data"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean a CSV file into another CSV file
    Clean(CleanArgs),
    /// Run a JSON job event against a local table store
    Job(JobArgs),
}

#[derive(Args, Debug)]
struct CleanArgs {
    /// Path to the CSV file to clean
    #[arg(short, long)]
    input: PathBuf,

    /// Path of the cleaned CSV file
    #[arg(short, long)]
    output: PathBuf,

    /// JSON file with cleaning options (camelCase keys); flags below override it
    #[arg(long)]
    options: Option<PathBuf>,

    /// Remove duplicate rows
    #[arg(long)]
    drop_duplicates: bool,

    /// Comma-separated list of columns to drop
    #[arg(long, value_delimiter = ',')]
    drop_columns: Vec<String>,

    /// Missing value policy (none, drop, fill)
    #[arg(long)]
    fill_na: Option<String>,

    /// Fill method when --fill-na is fill (mean, median, mode, backwards, custom)
    #[arg(long)]
    fill_na_value: Option<String>,

    /// Value used by the custom fill method
    #[arg(long)]
    fill_custom_value: Option<String>,

    /// Flag anomalous rows in an `anomaly` column
    #[arg(long)]
    anomaly_detection: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the report and counters.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct JobArgs {
    /// Path to the JSON job event ({"file_key": ..., "cleaning_options": {...}})
    #[arg(short, long)]
    event: PathBuf,

    /// Root directory of the local store (defaults to $SCRUBBER_STORE_ROOT, then ./data)
    #[arg(long)]
    store_root: Option<PathBuf>,

    /// Bucket to read the table from
    #[arg(long, default_value = DEFAULT_SOURCE_BUCKET)]
    source_bucket: String,

    /// Bucket to write the cleaned table to
    #[arg(long, default_value = DEFAULT_DESTINATION_BUCKET)]
    destination_bucket: String,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(level, quiet))
        .with_target(false)
        .init();
}

/// `RUST_LOG` wins over the command-line level; `.env` must already be loaded.
fn log_filter(level: &str, quiet: bool) -> EnvFilter {
    let effective_level = if quiet { "warn" } else { level };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env file (RUST_LOG included)
    dotenv().ok();

    let json_output = matches!(&cli.command, Command::Clean(args) if args.json);
    init_logging(&cli.log_level, cli.quiet, json_output);

    match cli.command {
        Command::Clean(args) => run_clean(&args),
        Command::Job(args) => run_job(&args),
    }
}

fn run_clean(args: &CleanArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let options = build_options(args)?;

    info!("Loading dataset from: {}", args.input.display());
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Could not read {}", args.input.display()))?;
    let df = decode_table(&bytes)?;
    info!("Dataset loaded successfully: {:?}", df.shape());

    let mut output = Pipeline::builder().options(options).build()?.process(df)?;

    write_output(&args.output, &mut output)?;

    if args.json {
        let summary = serde_json::json!({
            "output": args.output.display().to_string(),
            "report": output.report.entries(),
            "stats": output.stats,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(args, &output);
    }
    Ok(())
}

/// Merge the options file (if any) with the command-line flags.
fn build_options(args: &CleanArgs) -> Result<CleaningOptions> {
    let mut options = match &args.options {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Could not read options file {}", path.display()))?;
            CleaningOptions::from_json(&content)
                .with_context(|| format!("Invalid options file {}", path.display()))?
        }
        None => CleaningOptions::default(),
    };

    if args.drop_duplicates {
        options.drop_duplicates = true;
    }
    if !args.drop_columns.is_empty() {
        options.drop_columns = args.drop_columns.clone();
    }
    if let Some(policy) = &args.fill_na {
        options.fill_na = Some(policy.clone());
    }
    if let Some(method) = &args.fill_na_value {
        options.fill_na_value = Some(method.clone());
    }
    if let Some(value) = &args.fill_custom_value {
        options.fill_custom_na_value = Some(parse_fill_value(value));
    }
    if args.anomaly_detection {
        options.enable_anomaly_detection = true;
    }

    Ok(options)
}

/// Numbers and booleans keep their type; anything else is text.
fn parse_fill_value(raw: &str) -> FillValue {
    match serde_json::from_str::<FillValue>(raw) {
        Ok(FillValue::Text(_)) | Err(_) => FillValue::Text(raw.to_string()),
        Ok(value) => value,
    }
}

fn write_output(path: &Path, output: &mut PipelineOutput) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
        info!("Created output directory: {}", parent.display());
    }

    let bytes = encode_table(&mut output.table)?;
    std::fs::write(path, bytes).with_context(|| format!("Could not write {}", path.display()))?;
    info!("Dataset saved: {}", path.display());
    Ok(())
}

/// Print a human-readable summary of the run.
///
/// Uses `println!` intentionally: this is the command's result, not a log line.
fn print_summary(args: &CleanArgs, output: &PipelineOutput) {
    let stats = &output.stats;

    println!("\n{}", "=".repeat(60));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(60));
    println!("  Input:  {}", args.input.display());
    println!(
        "  Output: {} ({} rows x {} columns)",
        args.output.display(),
        output.table.height(),
        output.table.width()
    );
    println!();

    println!("STEPS");
    println!("{}", "-".repeat(40));
    if output.report.is_empty() {
        println!("  No cleaning steps enabled");
    } else {
        for entry in output.report.entries() {
            println!("  - {}", entry);
        }
    }
    println!();

    println!("ROWS");
    println!("{}", "-".repeat(40));
    println!("  Total:     {}", stats.total_rows);
    println!("  Duplicate: {}", stats.duplicate_rows);
    println!("  Modified:  {}", stats.modified_rows);
    println!("  Corrupted: {}", stats.corrupted_rows);
    println!("  Anomalous: {}", stats.anomalous_rows);
    println!("{}", "=".repeat(60));
}

fn run_job(args: &JobArgs) -> Result<()> {
    let store_root = args
        .store_root
        .clone()
        .or_else(|| std::env::var_os(STORE_ROOT_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./data"));

    let event = std::fs::read_to_string(&args.event)
        .with_context(|| format!("Could not read event file {}", args.event.display()))?;

    info!("Using local store at {}", store_root.display());
    let runner = JobRunner::new(LocalStore::new(store_root))
        .with_source_bucket(&args.source_bucket)
        .with_destination_bucket(&args.destination_bucket);

    let response = runner.handle_event(&event);
    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.is_success() {
        Ok(())
    } else {
        Err(anyhow!("Job failed with status {}", response.status_code))
    }
}
