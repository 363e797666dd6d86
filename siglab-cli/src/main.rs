//! siglab CLI: grid inspection, batch evaluation, sweeps and latest-bar checks.
//!
//! Commands:
//! - `grid`: print the grid cardinality and every row
//! - `evaluate`: evaluate one row over the full history, optionally export JSON
//! - `sweep`: evaluate every row, print the busiest rows, optionally export CSV
//! - `latest`: decide the final candle for one row and notify on entry
//!
//! Every command reads a TOML sweep config. The candle source in the config
//! can be overridden with `--candles` or `--synthetic`.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use siglab_core::{Candle, EvalContext, TracingSink};
use siglab_runner::{
    load_candles, write_evaluation_json, write_sweep_csv, CandleSource, LiveEvaluator,
    LogNotifier, ParamSweep, SweepConfig,
};

#[derive(Parser)]
#[command(
    name = "siglab",
    about = "siglab: technical-signal detection over OHLCV candles"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Path to a TOML sweep config.
    #[arg(long)]
    config: PathBuf,

    /// Read candles from this CSV instead of the configured source.
    #[arg(long, conflicts_with = "synthetic")]
    candles: Option<PathBuf>,

    /// Use this many synthetic candles instead of the configured source.
    #[arg(long)]
    synthetic: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print grid cardinality and all rows.
    Grid {
        /// Path to a TOML sweep config.
        #[arg(long)]
        config: PathBuf,
    },
    /// Evaluate one parameter row over the full candle history.
    Evaluate {
        #[command(flatten)]
        source: Source,

        /// Grid row index.
        #[arg(long, default_value_t = 0)]
        row: usize,

        /// Write the evaluation as JSON to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Evaluate every parameter row.
    Sweep {
        #[command(flatten)]
        source: Source,

        /// Run rows one after another instead of on the thread pool.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Number of rows to print, ranked by entry count.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Write the per-row summary as CSV to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Decide the final candle for one parameter row.
    Latest {
        #[command(flatten)]
        source: Source,

        /// Grid row index.
        #[arg(long, default_value_t = 0)]
        row: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Grid { config } => run_grid(config),
        Commands::Evaluate {
            source,
            row,
            output,
        } => run_evaluate(source, row, output),
        Commands::Sweep {
            source,
            sequential,
            top,
            output,
        } => run_sweep(source, sequential, top, output),
        Commands::Latest { source, row } => run_latest(source, row),
    }
}

fn load_config(path: &Path) -> Result<SweepConfig> {
    SweepConfig::load(path).with_context(|| format!("loading config {}", path.display()))
}

/// Config plus the candles it (or the command line) points at.
fn resolve(source: &Source) -> Result<(SweepConfig, Vec<Candle>)> {
    let mut config = load_config(&source.config)?;

    if let Some(path) = &source.candles {
        config.candles = CandleSource::Csv { path: path.clone() };
    } else if let Some(count) = source.synthetic {
        if count == 0 {
            bail!("--synthetic needs a positive candle count");
        }
        config.candles = config.candles.with_count(count);
    }

    let candles = load_candles(&config.candles).context("loading candles")?;
    info!(count = candles.len(), "candles ready");
    Ok((config, candles))
}

fn run_grid(config_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    let strategy = config.build_strategy()?;
    let grid = strategy.grid();

    println!("{}: {} rows", strategy.name(), grid.len());
    for row in grid.rows() {
        let values: Vec<String> = row
            .values
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        println!("{:>6}  {}", row.index, values.join("  "));
    }
    Ok(())
}

fn run_evaluate(source: Source, row: usize, output: Option<PathBuf>) -> Result<()> {
    let (config, candles) = resolve(&source)?;
    let strategy = config.build_strategy()?;
    let sink = TracingSink;
    let eval = strategy.evaluate_batch(&candles, row, &EvalContext::new(&sink))?;

    println!(
        "{} row {}: {} entries, {} exits over {} candles",
        strategy.name(),
        row,
        eval.entry_count(),
        eval.exit_count(),
        candles.len()
    );
    for i in eval.entry_indices() {
        let when = candles[i]
            .datetime()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| candles[i].timestamp.to_string());
        println!("  {when}  {}", strategy.entry_message(&eval, i));
    }

    if let Some(path) = output {
        write_evaluation_json(&path, &strategy, &eval, &candles)?;
        println!("Evaluation saved to: {}", path.display());
    }
    Ok(())
}

fn run_sweep(source: Source, sequential: bool, top: usize, output: Option<PathBuf>) -> Result<()> {
    let (config, candles) = resolve(&source)?;
    let strategy = config.build_strategy()?;
    let total = strategy.grid().len();

    let sweep = ParamSweep::new(strategy).with_parallelism(!sequential);
    let results = sweep.sweep_with_progress(&candles, |row, _, summary| {
        tracing::debug!(row, entries = summary.entry_count, "row done");
    })?;

    println!(
        "{}: {} rows, {} entries in total",
        results.strategy,
        total,
        results.total_entries()
    );
    for summary in results.top_n_by_entries(top) {
        let values: Vec<String> = summary
            .settings
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        println!(
            "{:>6}  entries={:<5} exits={:<5} {}",
            summary.row_index,
            summary.entry_count,
            summary.exit_count,
            values.join("  ")
        );
    }

    if let Some(path) = output {
        write_sweep_csv(&path, &results)?;
        println!("Sweep summary saved to: {}", path.display());
    }
    Ok(())
}

fn run_latest(source: Source, row: usize) -> Result<()> {
    let (config, candles) = resolve(&source)?;
    let mut live = LiveEvaluator::from_config(&config, row, Box::new(LogNotifier))?;
    println!("{}", live.describe_settings());

    let fired = live.on_candles(&candles)?;
    let when = candles
        .last()
        .and_then(|c| c.datetime())
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();
    println!(
        "{} at {when}: {}",
        live.strategy().name(),
        if fired { "ENTRY" } else { "no entry" }
    );
    Ok(())
}
