//! Reporting and export — trade ledger CSV, JSON reports, sweep tables.
//!
//! Persisted JSON carries a `schema_version`; unknown versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use orb_core::domain::TradeRecord;

use crate::backtest::{BacktestReport, DayStatus, SCHEMA_VERSION};
use crate::sweep::SweepResults;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a report to pretty JSON.
pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a report, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

/// Trades as a pretty JSON array.
pub fn export_trades_json(trades: &[TradeRecord]) -> Result<String> {
    serde_json::to_string_pretty(trades).context("failed to serialize trades to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Trade ledger as CSV, one row per closed position.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "trade_id",
        "date",
        "side",
        "entry_time",
        "exit_time",
        "underlying_entry",
        "underlying_exit",
        "h3",
        "l3",
        "h1",
        "l1",
        "strike",
        "option_type",
        "option_symbol",
        "expiry",
        "entry_premium",
        "exit_premium",
        "lots",
        "lot_size",
        "gross_pnl",
        "charges",
        "net_pnl",
        "exit_reason",
        "re_entry_number",
        "regime_at_exit",
        "ladder_stage",
        "final_sl",
        "highest_premium_gain",
    ])?;

    for t in trades {
        wtr.write_record([
            t.position_id.to_string(),
            t.trading_day.to_string(),
            t.direction.to_string(),
            t.entry_time.format(TIME_FORMAT).to_string(),
            t.exit_time.format(TIME_FORMAT).to_string(),
            format!("{:.2}", t.entry_underlying_level),
            format!("{:.2}", t.exit_underlying),
            format!("{:.2}", t.h3),
            format!("{:.2}", t.l3),
            format!("{:.2}", t.h1),
            format!("{:.2}", t.l1),
            format!("{:.0}", t.instrument.strike),
            t.instrument.right.to_string(),
            t.instrument.symbol(),
            t.instrument.expiry.to_string(),
            format!("{:.2}", t.entry_price),
            format!("{:.2}", t.exit_price),
            t.lots.to_string(),
            t.lot_size.to_string(),
            format!("{:.2}", t.gross_pnl),
            format!("{:.2}", t.total_fees()),
            format!("{:.2}", t.net_pnl),
            t.exit_reason.to_string(),
            t.reentry_number.to_string(),
            t.regime_at_exit.to_string(),
            t.ladder_stage.to_string(),
            format!("{:.2}", t.final_sl.value()),
            format!("{:.2}", t.peak_gain),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Per-day summary as CSV.
pub fn export_days_csv(report: &BacktestReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "status", "trades", "gross_pnl", "charges", "net_pnl", "note"])?;
    for day in &report.days {
        let (status, note) = match &day.status {
            DayStatus::Completed => ("completed", String::new()),
            DayStatus::Skipped { reason } => ("skipped", reason.clone()),
        };
        wtr.write_record([
            day.day.to_string(),
            status.to_string(),
            day.trade_count().to_string(),
            format!("{:.2}", day.gross_pnl),
            format!("{:.2}", day.charges),
            format!("{:.2}", day.net_pnl),
            note,
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Ranked sweep table as CSV.
pub fn export_sweep_csv(results: &SweepResults) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "rank",
        "label",
        "itm_offset",
        "entry_cutoff",
        "orb_candles",
        "force_exit",
        "ladder_t1",
        "ladder_step",
        "trades",
        "win_rate",
        "net_pnl",
        "profit_factor",
        "max_drawdown",
        "sharpe",
        "fingerprint",
    ])?;
    for (i, e) in results.all().iter().enumerate() {
        wtr.write_record([
            (i + 1).to_string(),
            e.label.clone(),
            format!("{:.0}", e.point.itm_offset),
            e.point.entry_cutoff.format("%H:%M").to_string(),
            e.point.orb_candles.to_string(),
            e.point.force_exit.format("%H:%M").to_string(),
            format!("{:.0}", e.point.ladder_t1),
            format!("{:.0}", e.point.ladder_step),
            e.metrics.total_trades.to_string(),
            format!("{:.4}", e.metrics.win_rate),
            format!("{:.2}", e.metrics.net_pnl),
            format!("{:.3}", e.metrics.profit_factor),
            format!("{:.2}", e.metrics.max_drawdown),
            format!("{:.3}", e.metrics.sharpe),
            e.fingerprint.clone(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the artifact set for a run into `{output_dir}/{fingerprint prefix}/`:
/// - `report.json` — the full `BacktestReport`
/// - `trades.csv` — trade ledger
/// - `trades.json` — trade ledger as JSON
/// - `days.csv` — per-day summary
///
/// Returns the created directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    let short = report.fingerprint.get(..12).unwrap_or(&report.fingerprint);
    let run_dir = output_dir.join(format!("run_{short}"));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let trades: Vec<TradeRecord> = report.trades().cloned().collect();
    write(&run_dir.join("report.json"), &export_json(report)?)?;
    write(&run_dir.join("trades.csv"), &export_trades_csv(&trades)?)?;
    write(&run_dir.join("trades.json"), &export_trades_json(&trades)?)?;
    write(&run_dir.join("days.csv"), &export_days_csv(report)?)?;

    Ok(run_dir)
}

/// Load a report from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<BacktestReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}
