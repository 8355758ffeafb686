//! LeverLab CLI — sweep, synthetic data and config validation commands.
//!
//! Commands:
//! - `run` — execute a parameter sweep from a TOML config over CSV or synthetic inputs
//! - `synth` — write seeded synthetic price and entry CSVs
//! - `validate` — check a sweep config and report the grid size

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use leverlab_core::domain::StrategyRecord;
use leverlab_runner::data_loader::{write_entries_csv, write_prices_csv};
use leverlab_runner::export::TOP_N;
use leverlab_runner::synthetic::{generate, SyntheticConfig};
use leverlab_runner::{
    load_entries, load_prices, save_artifacts, ArtifactOptions, LogSink, Logger, SweepConfig,
    SweepDriver, SweepError, SweepInputs, SweepSummary,
};

#[derive(Parser)]
#[command(
    name = "leverlab",
    about = "LeverLab CLI — leveraged parameter-sweep backtesting engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a parameter sweep from a TOML config file.
    Run {
        /// Path to a TOML sweep config.
        #[arg(long)]
        config: PathBuf,

        /// Price CSV with four columns per symbol (open, high, low, close).
        #[arg(long)]
        prices: Option<PathBuf>,

        /// Entry-signal CSV with one column per (symbol, indicator setting).
        #[arg(long)]
        entries: Option<PathBuf>,

        /// Use seeded synthetic inputs instead of CSV files.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed for --synthetic.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output directory. Overrides `[output] dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Run combinations on one thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Skip per-bar order records.
        #[arg(long, default_value_t = false)]
        no_order_records: bool,
    },
    /// Write seeded synthetic price and entry CSVs.
    Synth {
        #[arg(long, default_value_t = 1)]
        symbols: usize,

        #[arg(long, default_value_t = 500)]
        bars: usize,

        /// Indicator settings per symbol.
        #[arg(long, default_value_t = 1)]
        indicators: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Probability that an entry fires on a bar.
        #[arg(long, default_value_t = 0.05)]
        entry_probability: f64,

        /// Directory for prices.csv and entries.csv.
        #[arg(long, default_value = "data")]
        output_dir: PathBuf,
    },
    /// Validate a sweep config without running it.
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            prices,
            entries,
            synthetic,
            seed,
            output_dir,
            sequential,
            no_order_records,
        } => run_sweep_cmd(RunArgs {
            config,
            prices,
            entries,
            synthetic,
            seed,
            output_dir,
            sequential,
            no_order_records,
        }),
        Commands::Synth {
            symbols,
            bars,
            indicators,
            seed,
            entry_probability,
            output_dir,
        } => run_synth(
            SyntheticConfig {
                symbols,
                bars,
                indicators_per_symbol: indicators,
                seed,
                entry_probability,
                ..SyntheticConfig::default()
            },
            &output_dir,
        ),
        Commands::Validate { config } => run_validate(&config),
    }
}

struct RunArgs {
    config: PathBuf,
    prices: Option<PathBuf>,
    entries: Option<PathBuf>,
    synthetic: bool,
    seed: u64,
    output_dir: Option<PathBuf>,
    sequential: bool,
    no_order_records: bool,
}

fn run_sweep_cmd(args: RunArgs) -> Result<()> {
    let mut config = SweepConfig::from_file(&args.config)?;
    if args.sequential {
        config.run.parallel = false;
    }
    if args.no_order_records {
        config.output.order_records = false;
    }
    if let Some(dir) = args.output_dir {
        config.output.dir = dir;
    }

    let grid = config.validate()?;
    let inputs = load_inputs(&args.prices, &args.entries, args.synthetic, args.seed)?;

    let logger = Logger::from_config(&config.logging).context("failed to open log sink")?;
    let logger: Arc<dyn LogSink> = Arc::new(logger);

    let abort = Arc::new(AtomicBool::new(false));
    {
        let abort = Arc::clone(&abort);
        if let Err(e) = ctrlc::set_handler(move || {
            log::warn!("interrupt received, stopping after the current combinations");
            abort.store(true, Ordering::Release);
        }) {
            log::warn!("failed to set Ctrl-C handler: {e}");
        }
    }

    let driver = SweepDriver::from_config(&config)
        .with_logger(logger)
        .with_abort(Arc::clone(&abort));

    log::info!(
        "sweeping {} combinations ({} symbols x {} indicator settings x {} order settings, {} bars)",
        inputs.combinations(grid.len()),
        inputs.num_symbols(),
        inputs.indicators_per_symbol(),
        grid.len(),
        inputs.bars()
    );

    let output = match driver.run(&inputs, &grid) {
        Ok(output) => output,
        Err(SweepError::Aborted { completed, total }) => {
            eprintln!("Sweep interrupted after {completed} of {total} combinations");
            std::process::exit(130);
        }
        Err(e) => return Err(e.into()),
    };

    let summary = SweepSummary::new(driver.statics(), &inputs, grid.len(), &output, Utc::now());
    print_summary(&summary);

    let run_dir = save_artifacts(
        &summary,
        &output,
        &config.output.dir,
        ArtifactOptions {
            csv: config.output.csv,
            json: config.output.json,
        },
    )?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn load_inputs(
    prices: &Option<PathBuf>,
    entries: &Option<PathBuf>,
    synthetic: bool,
    seed: u64,
) -> Result<SweepInputs> {
    match (prices, entries, synthetic) {
        (None, None, true) => Ok(generate(&SyntheticConfig {
            seed,
            ..SyntheticConfig::default()
        })?),
        (Some(_), _, true) | (_, Some(_), true) => {
            bail!("--synthetic and --prices/--entries are mutually exclusive")
        }
        (Some(p), Some(e), false) => {
            let (price_data, _headers) = load_prices(p)?;
            let signals = load_entries(e)?;
            Ok(SweepInputs::new(price_data, signals)?)
        }
        _ => bail!("both --prices and --entries are required (or pass --synthetic)"),
    }
}

fn run_synth(config: SyntheticConfig, output_dir: &Path) -> Result<()> {
    let inputs = generate(&config)?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let prices_path = output_dir.join("prices.csv");
    let entries_path = output_dir.join("entries.csv");
    write_prices_csv(&prices_path, inputs.prices())?;
    write_entries_csv(&entries_path, inputs.entries(), inputs.indicators_per_symbol())?;

    println!(
        "Wrote {} symbols x {} bars to {}",
        inputs.num_symbols(),
        inputs.bars(),
        prices_path.display()
    );
    println!(
        "Wrote {} entry columns to {}",
        inputs.num_symbols() * inputs.indicators_per_symbol(),
        entries_path.display()
    );
    Ok(())
}

fn run_validate(path: &Path) -> Result<()> {
    let config = SweepConfig::from_file(path)?;
    let grid = config.validate()?;
    let statics = config.static_variables();
    println!("Config OK: {}", path.display());
    println!("  Side:            {:?}", statics.side());
    println!("  Equity:          {:.2}", statics.equity);
    println!("  Order settings:  {}", grid.len());
    println!("  Output dir:      {}", config.output.dir.display());
    Ok(())
}

fn print_summary(summary: &SweepSummary) {
    println!();
    println!("=== Sweep Summary ===");
    println!("Combinations:    {}", summary.combinations_run);
    println!("Halted:          {}", summary.halted);
    println!("Order records:   {}", summary.order_records);
    println!("Kept strategies: {}", summary.strategy_records);
    println!("Output hash:     {}", summary.output_hash);

    if summary.top.is_empty() {
        println!("No combination passed the filters.");
        return;
    }

    println!();
    println!("Top {} by gains:", TOP_N.min(summary.top.len()));
    println!(
        "{:>4} {:>4} {:>6} {:>7} {:>8} {:>10} {:>8}",
        "Sym", "Ind", "Order", "Trades", "Win %", "Gains %", "Upside"
    );
    println!("{}", "-".repeat(53));
    for r in &summary.top {
        print_row(r);
    }
}

fn print_row(r: &StrategyRecord) {
    println!(
        "{:>4} {:>4} {:>6} {:>7} {:>8.2} {:>10.2} {:>8.3}",
        r.symbol_idx,
        r.indicator_settings_idx,
        r.order_settings_idx,
        r.total_trades,
        r.win_rate * 100.0,
        r.gains_pct,
        r.to_the_upside
    );
}
