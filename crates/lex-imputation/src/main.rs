//! CLI entry point for dataset exploration and stochastic regression imputation.

use anyhow::Result;
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use lex_imputation::{
    ExplorationReport, Explorer, ImputationError, ImputationReport, ImputerConfig, LoadOptions,
    ProjectionTable, RowOrder, SpreadPolicy, StochasticRegressionImputer, io, preparation,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

/// CLI-compatible row order enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliRowOrder {
    /// Keep every row where it was
    Preserve,
    /// Complete rows first, then imputed rows
    CompleteFirst,
}

impl From<CliRowOrder> for RowOrder {
    fn from(cli: CliRowOrder) -> Self {
        match cli {
            CliRowOrder::Preserve => RowOrder::Preserve,
            CliRowOrder::CompleteFirst => RowOrder::CompleteFirst,
        }
    }
}

/// CLI-compatible spread policy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSpreadPolicy {
    /// Fail when the residual spread is undefined
    Fail,
    /// Impute bare predictions when the residual spread is undefined
    Zero,
}

impl From<CliSpreadPolicy> for SpreadPolicy {
    fn from(cli: CliSpreadPolicy) -> Self {
        match cli {
            CliSpreadPolicy::Fail => SpreadPolicy::Fail,
            CliSpreadPolicy::Zero => SpreadPolicy::Zero,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "lex-imputation",
    author = "Lex Machina Team",
    version,
    about = "Stochastic regression imputation for tabular data",
    long_about = "Fills missing values of a numeric column with regression predictions plus noise.\n\n\
                  EXAMPLES:\n  \
                  # Inspect a dataset\n  \
                  lex-imputation explore -i data/train.csv\n\n  \
                  # Impute LotFrontage reproducibly and save the result\n  \
                  lex-imputation impute -i data/train.csv -t LotFrontage --seed 0 -o outputs/imputed.csv\n\n  \
                  # Machine-readable summary\n  \
                  lex-imputation impute -i data/train.csv -t LotFrontage --json | jq .summary"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; errors are printed as JSON too.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// Field value read as missing (repeatable)
    #[arg(long = "null-marker", default_value = "NA")]
    null_markers: Vec<String>,

    /// Rows scanned to infer column types (0 scans the whole file)
    #[arg(long, default_value = "10000")]
    infer_schema_length: usize,
}

impl LoadArgs {
    fn to_options(&self) -> LoadOptions {
        LoadOptions {
            null_markers: self.null_markers.clone(),
            infer_schema_length: (self.infer_schema_length > 0).then_some(self.infer_schema_length),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report column types, missing data and value variety
    Explore(ExploreArgs),

    /// Impute the missing values of one column
    Impute(ImputeArgs),
}

#[derive(Args, Debug)]
struct ExploreArgs {
    /// Path to the CSV file to explore
    #[arg(short, long)]
    input: PathBuf,

    #[command(flatten)]
    load: LoadArgs,
}

#[derive(Args, Debug)]
struct ImputeArgs {
    /// Path to the CSV file to impute
    #[arg(short, long)]
    input: PathBuf,

    /// Column to impute
    #[arg(short, long)]
    target: String,

    /// Seed for the noise generator (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the imputed table
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Where to write the first-component projection of the imputed table
    #[arg(long)]
    projection_output: Option<PathBuf>,

    /// Order of rows in the output
    #[arg(long, value_enum, default_value = "preserve")]
    row_order: CliRowOrder,

    /// What to do when there are too few complete rows to estimate the noise
    #[arg(long, value_enum, default_value = "fail")]
    spread_policy: CliSpreadPolicy,

    /// Ridge penalty on the standardized coefficients (0 disables)
    #[arg(long, default_value = "0.0")]
    ridge: f64,

    /// Suffix of the added indicator column
    #[arg(long, default_value = "_missing")]
    indicator_suffix: String,

    #[command(flatten)]
    load: LoadArgs,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout carries only JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.quiet, cli.json);

    let result = match &cli.command {
        Command::Explore(args) => run_explore(args, cli.json),
        Command::Impute(args) => run_impute(args, cli.json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, cli.json);
            ExitCode::FAILURE
        }
    }
}

fn report_error(err: &anyhow::Error, json_output: bool) {
    if json_output {
        let payload = match err.downcast_ref::<ImputationError>() {
            Some(imputation_error) => serde_json::json!({ "error": imputation_error }),
            None => serde_json::json!({
                "error": { "code": "ERROR", "message": format!("{:#}", err) }
            }),
        };
        println!("{}", payload);
    } else {
        eprintln!("Error: {:#}", err);
    }
}

fn run_explore(args: &ExploreArgs, json_output: bool) -> Result<()> {
    let df = io::load_csv(&args.input, &args.load.to_options())?;
    let report = Explorer::default().explore(&df)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_exploration_report(&args.input, &report);
    }
    Ok(())
}

fn run_impute(args: &ImputeArgs, json_output: bool) -> Result<()> {
    let config = ImputerConfig::builder()
        .indicator_suffix(args.indicator_suffix.as_str())
        .row_order(args.row_order.into())
        .spread_policy(args.spread_policy.into())
        .ridge_penalty(args.ridge)
        .build()
        .map_err(ImputationError::from)?;

    let target = args.target.as_str();
    let df = io::load_csv(&args.input, &args.load.to_options())?;
    let prepared = preparation::prepare_for_imputation(&df, target)?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let imputation =
        StochasticRegressionImputer::new(config).impute_with_summary(&prepared.frame, target, &mut rng)?;
    let summary = imputation.summary;
    let mut frame = imputation.frame;

    if let Some(path) = &args.output {
        io::write_csv(&mut frame, path)?;
        info!("Imputed table written to: {}", path.display());
    }

    if let Some(path) = &args.projection_output {
        let table = ProjectionTable::build(&frame, target, &summary.indicator_column)?;
        io::write_csv(&mut table.to_frame()?, path)?;
        info!("Projection written to: {}", path.display());
    }

    let report = ImputationReport {
        generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        input_file: args.input.display().to_string(),
        output_file: args.output.as_ref().map(|p| p.display().to_string()),
        original_shape: df.shape(),
        prepared_shape: prepared.frame.shape(),
        preparation_steps: prepared.steps,
        summary,
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_imputation_report(&report, frame.shape());
    }
    Ok(())
}

/// Print the exploration report.
///
/// Uses `println!` intentionally: the report is the command's output, not a log.
fn print_exploration_report(input: &Path, report: &ExplorationReport) {
    println!();
    println!("{}", "=".repeat(80));
    println!("DATASET EXPLORATION");
    println!("{}", "=".repeat(80));
    println!();

    println!("File: {}", input.display());
    println!("Rows: {}  Columns: {}", report.shape.0, report.shape.1);
    println!();

    println!("COLUMN TYPES");
    println!("{}", "-".repeat(40));
    for (dtype, count) in &report.dtype_counts {
        println!("  {:<12} {}", dtype, count);
    }
    println!("  Float features: {}", report.float_features.join(", "));
    println!();

    let categorical = &report.categorical;
    println!("CATEGORICAL FEATURES");
    println!("{}", "-".repeat(40));
    println!("  {} categorical candidates", categorical.categorical_features.len());
    println!(
        "  {} string features with many distinct values: {}",
        categorical.high_cardinality_string_features.len(),
        categorical.high_cardinality_string_features.join(", ")
    );
    println!(
        "  {} integer features that might be categorical: {}",
        categorical.categorical_integer_features.len(),
        categorical.categorical_integer_features.join(", ")
    );
    println!();

    println!("MISSING DATA");
    println!("{}", "-".repeat(40));
    for (label, rates) in [
        ("high", &report.missing.high),
        ("medium", &report.missing.medium),
        ("low", &report.missing.low),
    ] {
        println!("  {} features with {} missing data", rates.len(), label);
        for rate in rates.iter() {
            println!("    {:<24} {:>6.1}%", rate.column, rate.fraction * 100.0);
        }
    }
    println!();

    println!("DOMINANT VALUES");
    println!("{}", "-".repeat(40));
    for dominant in &report.dominant_values {
        println!(
            "  {:<24} \"{}\" covers {:.1}%",
            dominant.column,
            dominant.value,
            dominant.fraction * 100.0
        );
    }
    println!();

    if !report.empty_columns.is_empty() {
        println!("Columns without data: {}", report.empty_columns.join(", "));
    }
    for fixed in &report.fixed_columns {
        println!("\"{}\" is always: {}", fixed.column, fixed.value);
    }
    println!();

    println!("LIMITED VARIETY");
    println!("{}", "-".repeat(40));
    for distribution in &report.limited_variety {
        println!("  \"{}\":", distribution.column);
        for value in &distribution.counts {
            println!("    (#={:7}): \"{}\"", value.count, value.value);
        }
    }
    println!();
    println!("Use --json for machine-readable output");
}

/// Print a human-readable summary of the imputation.
fn print_imputation_report(report: &ImputationReport, imputed_shape: (usize, usize)) {
    let summary = &report.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("IMPUTATION COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:    {} ({} rows x {} columns)",
        report.input_file, report.original_shape.0, report.original_shape.1
    );
    println!(
        "Prepared: {} rows x {} columns",
        report.prepared_shape.0, report.prepared_shape.1
    );
    match report.output_file {
        Some(ref output_file) => println!(
            "Output:   {} ({} rows x {} columns)",
            output_file, imputed_shape.0, imputed_shape.1
        ),
        None => println!("Output:   not written (use --output)"),
    }
    println!();

    if !report.preparation_steps.is_empty() {
        println!("Preparation:");
        for step in &report.preparation_steps {
            println!("  - {}", step);
        }
        println!();
    }

    println!("Target Column: {}", summary.target_column);
    println!(
        "  Missing before: {} of {} ({:.1}%)",
        summary.imputed_rows,
        summary.rows,
        summary.imputed_percentage()
    );
    println!("  Missing after:  0");
    println!("  Indicator:      {}", summary.indicator_column);
    println!();

    println!("Model:");
    println!("  Intercept: {:.6}", summary.intercept);
    for coefficient in &summary.coefficients {
        println!("  {:<24} {:>14.6}", coefficient.feature, coefficient.value);
    }
    println!("  Residual std: {:.6}", summary.residual_std);
    if let Some(r_squared) = summary.r_squared {
        println!("  R^2: {:.4}", r_squared);
    }
    println!();
    println!("Use --json for machine-readable output");
}
