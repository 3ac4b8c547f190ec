//! ORB CLI — backtest, sweep and data commands.
//!
//! Commands:
//! - `run` — backtest candle data with a TOML config or named preset
//! - `sweep` — evaluate the parameter grid and rank by net P&L
//! - `synthetic` — generate seeded minute candles as CSV
//! - `validate-config` — check a config file and print its fingerprint
//! - `preset` — print a named preset as TOML

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use orb_core::strategy::OptionChain;
use orb_core::{MemoryLedger, StrategyConfig};
use orb_runner::export::{export_sweep_csv, save_artifacts};
use orb_runner::{
    config_fingerprint, load_candles_csv, load_config, load_premiums_csv, render_config,
    run_backtest, run_sweep, synthetic_days, write_candles_csv, BacktestOptions, BacktestReport,
    DayCandles, DayStatus, SweepGrid, SweepResults, SyntheticChain,
};

#[derive(Parser)]
#[command(name = "orb", about = "ORB — intraday opening-range breakout options engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by `run` and `sweep`.
#[derive(clap::Args)]
struct DataArgs {
    /// Underlying minute candles CSV (timestamp,open,high,low,close).
    #[arg(long)]
    candles: PathBuf,

    /// Option premiums CSV. Without it, premiums come from the synthetic
    /// fixed-delta model.
    #[arg(long)]
    premiums: Option<PathBuf>,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Named preset: original, tuned.
    #[arg(long)]
    preset: Option<String>,

    /// First day to run (YYYY-MM-DD).
    #[arg(long)]
    start: Option<String>,

    /// Last day to run (YYYY-MM-DD).
    #[arg(long)]
    end: Option<String>,

    /// Run days one after another instead of in parallel.
    #[arg(long, default_value_t = false)]
    sequential: bool,

    /// Previous-day candles used to warm up the indicators.
    #[arg(long, default_value_t = 30)]
    warmup: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest candle data and save the trade ledger and report.
    Run {
        #[command(flatten)]
        data: DataArgs,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Evaluate the parameter grid on top of a base config.
    Sweep {
        #[command(flatten)]
        data: DataArgs,

        /// Number of ranked configurations to print.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Minimum trades for a configuration to be listed.
        #[arg(long, default_value_t = 5)]
        min_trades: usize,

        /// Output directory for sweep.csv and sweep.json.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Generate seeded synthetic minute candles.
    Synthetic {
        /// First day (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// Last day (YYYY-MM-DD).
        #[arg(long)]
        end: String,

        /// Seed label; the same label always yields the same data.
        #[arg(long, default_value = "nifty")]
        label: String,

        /// Opening price of the first day.
        #[arg(long, default_value_t = 22_000.0)]
        first_open: f64,

        /// Output CSV path.
        #[arg(long, default_value = "synthetic_candles.csv")]
        out: PathBuf,
    },
    /// Validate a TOML config and print its fingerprint.
    ValidateConfig {
        /// Path to the TOML config file.
        path: PathBuf,
    },
    /// Print a named preset as TOML.
    Preset {
        /// original or tuned.
        name: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { data, output_dir } => run_cmd(&data, &output_dir),
        Commands::Sweep {
            data,
            top,
            min_trades,
            output_dir,
        } => sweep_cmd(&data, top, min_trades, &output_dir),
        Commands::Synthetic {
            start,
            end,
            label,
            first_open,
            out,
        } => synthetic_cmd(&start, &end, &label, first_open, &out),
        Commands::ValidateConfig { path } => validate_cmd(&path),
        Commands::Preset { name } => {
            print!("{}", render_config(&preset(&name)?)?);
            Ok(())
        }
    }
}

fn run_cmd(data: &DataArgs, output_dir: &Path) -> Result<()> {
    let config = resolve_config(data)?;
    let days = load_days(data)?;
    let chain = load_chain(data, &config, &days)?;

    let ledger = MemoryLedger::new();
    let report = run_backtest(&config, &days, chain.as_ref(), &ledger, &options(data))?;
    print_summary(&report);

    let run_dir = save_artifacts(&report, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn sweep_cmd(data: &DataArgs, top: usize, min_trades: usize, output_dir: &Path) -> Result<()> {
    let base = resolve_config(data)?;
    let days = load_days(data)?;
    let chain = load_chain(data, &base, &days)?;

    let grid = SweepGrid::default();
    info!(points = grid.size(), "running sweep");
    let results = run_sweep(&base, &grid, &days, chain.as_ref(), &options(data))?;
    print_sweep(&results, top, min_trades);

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let csv_path = output_dir.join("sweep.csv");
    std::fs::write(&csv_path, export_sweep_csv(&results)?)
        .with_context(|| format!("failed to write {}", csv_path.display()))?;
    let json_path = output_dir.join("sweep.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&results)?)
        .with_context(|| format!("failed to write {}", json_path.display()))?;
    println!("Sweep saved to: {}", output_dir.display());
    Ok(())
}

fn synthetic_cmd(start: &str, end: &str, label: &str, first_open: f64, out: &Path) -> Result<()> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if end < start {
        bail!("--end {end} is before --start {start}");
    }
    let open = StrategyConfig::original().session.market_open;
    let days = synthetic_days(label, start, end, first_open, open);
    write_candles_csv(&days, out)?;
    println!(
        "Wrote {} synthetic day(s) to {}",
        days.len(),
        out.display()
    );
    Ok(())
}

fn validate_cmd(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    println!("Config OK: {}", path.display());
    println!("Fingerprint: {}", config_fingerprint(&config)?);
    Ok(())
}

fn preset(name: &str) -> Result<StrategyConfig> {
    match name {
        "original" => Ok(StrategyConfig::original()),
        "tuned" => Ok(StrategyConfig::tuned()),
        _ => bail!("unknown preset '{name}'. Valid: original, tuned"),
    }
}

fn resolve_config(data: &DataArgs) -> Result<StrategyConfig> {
    match (&data.config, &data.preset) {
        (Some(_), Some(_)) => bail!("--config and --preset are mutually exclusive"),
        (Some(path), None) => Ok(load_config(path)?),
        (None, Some(name)) => preset(name),
        (None, None) => {
            info!("no --config or --preset given; using the original preset");
            Ok(StrategyConfig::original())
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("invalid date '{raw}'"))
}

fn load_days(data: &DataArgs) -> Result<DayCandles> {
    let mut days = load_candles_csv(&data.candles)?;
    let start = data.start.as_deref().map(parse_date).transpose()?;
    let end = data.end.as_deref().map(parse_date).transpose()?;
    days.retain(|day, _| start.map_or(true, |s| *day >= s) && end.map_or(true, |e| *day <= e));
    if days.is_empty() {
        bail!("no trading days in {} for the requested range", data.candles.display());
    }
    Ok(days)
}

fn load_chain(data: &DataArgs, config: &StrategyConfig, days: &DayCandles) -> Result<Box<dyn OptionChain>> {
    match &data.premiums {
        Some(path) => Ok(Box::new(load_premiums_csv(path)?)),
        None => {
            warn!("no --premiums given; using the synthetic premium model");
            Ok(Box::new(SyntheticChain::from_candles(
                &config.instrument.underlying,
                days.values().flatten(),
            )))
        }
    }
}

fn options(data: &DataArgs) -> BacktestOptions {
    BacktestOptions {
        parallel: !data.sequential,
        warmup_candles: data.warmup,
        ..BacktestOptions::default()
    }
}

fn print_summary(report: &BacktestReport) {
    let m = &report.metrics;
    let first = report.days.first().map(|d| d.day.to_string()).unwrap_or_default();
    let last = report.days.last().map(|d| d.day.to_string()).unwrap_or_default();
    println!();
    println!("=== Backtest Result ===");
    println!("Period:          {first} to {last}");
    println!("Days:            {} ({} skipped)", m.total_days, m.skipped_days);
    println!("Trades:          {}", m.total_trades);
    println!();
    println!("--- Performance ---");
    println!("Net P&L:         {:.2}", m.net_pnl);
    println!("Gross P&L:       {:.2}", m.gross_pnl);
    println!("Charges:         {:.2}", m.total_charges);
    println!("Win Rate:        {:.1}%", m.win_rate * 100.0);
    println!("Avg Win:         {:.2}", m.avg_win);
    println!("Avg Loss:        {:.2}", m.avg_loss);
    println!("Reward:Risk      {:.2}", m.reward_to_risk);
    println!("Profit Factor:   {:.2}", m.profit_factor);
    println!("Max Drawdown:    {:.2}", m.max_drawdown);
    println!("Sharpe:          {:.3}", m.sharpe);
    println!("Avg Daily P&L:   {:.2}", m.avg_daily_pnl);
    println!("Max Consec Win:  {}", m.max_consecutive_wins);
    println!("Max Consec Loss: {}", m.max_consecutive_losses);
    for day in report.skipped_days() {
        if let DayStatus::Skipped { reason } = &day.status {
            println!("WARNING: {} skipped: {reason}", day.day);
        }
    }
    println!();
}

fn print_sweep(results: &SweepResults, top: usize, min_trades: usize) {
    println!();
    println!("=== Sweep: top {top} of {} (min {min_trades} trades) ===", results.len());
    println!(
        "{:<4} {:<38} {:>6} {:>7} {:>12} {:>8} {:>8}",
        "Rank", "Config", "Trades", "Win%", "Net P&L", "PF", "Sharpe"
    );
    println!("{}", "-".repeat(89));
    for (i, e) in results.top_n(top, min_trades).iter().enumerate() {
        println!(
            "{:<4} {:<38} {:>6} {:>6.1}% {:>12.2} {:>8.2} {:>8.3}",
            i + 1,
            e.label,
            e.metrics.total_trades,
            e.metrics.win_rate * 100.0,
            e.metrics.net_pnl,
            e.metrics.profit_factor,
            e.metrics.sharpe
        );
    }
    println!();
}
