//! Multi-day backtest driver.
//!
//! Each trading day is an independent `TradingSession` with its own
//! in-memory ledger. Days run sequentially or in parallel on rayon; a
//! finished day's trades are appended to the shared ledger as one batch.
//! A day that hits a data gap is skipped and reported, never retried.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use orb_core::domain::{Candle, TradeRecord};
use orb_core::indicators::IndicatorSeries;
use orb_core::strategy::OptionChain;
use orb_core::{MemoryLedger, OrbError, StrategyConfig, TradeLedger, TradingSession};

use crate::config::config_fingerprint;
use crate::data_loader::{dataset_hash, DayCandles};
use crate::error::RunError;
use crate::metrics::{PerformanceMetrics, DEFAULT_RISK_FREE_RATE};

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Options for a multi-day run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestOptions {
    /// Run days in parallel.
    pub parallel: bool,
    /// Previous-day candles fed to the indicators before each session.
    pub warmup_candles: usize,
    /// Annual risk-free rate for the Sharpe ratio.
    pub risk_free_rate: f64,
}

impl Default for BacktestOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            warmup_candles: 30,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }
}

/// Outcome of one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DayStatus {
    Completed,
    Skipped { reason: String },
}

/// Per-day trades and totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayResult {
    pub day: NaiveDate,
    #[serde(flatten)]
    pub status: DayStatus,
    pub trades: Vec<TradeRecord>,
    pub gross_pnl: f64,
    pub net_pnl: f64,
    pub charges: f64,
    pub candle_count: usize,
    /// Entry attempts abandoned for want of a contract or premium.
    pub abandoned_entries: usize,
}

impl DayResult {
    pub fn completed(day: NaiveDate, trades: Vec<TradeRecord>, candle_count: usize, abandoned_entries: usize) -> Self {
        Self {
            day,
            status: DayStatus::Completed,
            gross_pnl: trades.iter().map(|t| t.gross_pnl).sum(),
            net_pnl: trades.iter().map(|t| t.net_pnl).sum(),
            charges: trades.iter().map(TradeRecord::total_fees).sum(),
            trades,
            candle_count,
            abandoned_entries,
        }
    }

    pub fn skipped(day: NaiveDate, reason: impl Into<String>, candle_count: usize) -> Self {
        Self {
            day,
            status: DayStatus::Skipped { reason: reason.into() },
            trades: Vec::new(),
            gross_pnl: 0.0,
            net_pnl: 0.0,
            charges: 0.0,
            candle_count,
            abandoned_entries: 0,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == DayStatus::Completed
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn winning_trades(&self) -> usize {
        self.trades.iter().filter(|t| t.is_winner()).count()
    }
}

/// Result of a multi-day run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// BLAKE3 fingerprint of the strategy config.
    pub fingerprint: String,
    /// BLAKE3 hash of the candle data.
    pub dataset_hash: String,
    pub config: StrategyConfig,
    pub days: Vec<DayResult>,
    pub metrics: PerformanceMetrics,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestReport {
    /// Every trade, in day order.
    pub fn trades(&self) -> impl Iterator<Item = &TradeRecord> {
        self.days.iter().flat_map(|d| d.trades.iter())
    }

    pub fn skipped_days(&self) -> impl Iterator<Item = &DayResult> {
        self.days.iter().filter(|d| !d.is_completed())
    }
}

/// Run one trading day and append its trades to `ledger` as one batch.
///
/// A data gap skips the day. Configuration and invariant errors are fatal.
pub fn run_day(
    config: &StrategyConfig,
    day: NaiveDate,
    candles: &[Candle],
    warmup: &[Candle],
    chain: &dyn OptionChain,
    ledger: &dyn TradeLedger,
) -> Result<DayResult, RunError> {
    if candles.is_empty() {
        warn!(%day, "no candles; day skipped");
        return Ok(DayResult::skipped(day, "no candles", 0));
    }

    let indicators = IndicatorSeries::compute(&config.filter, warmup, candles);
    let day_ledger = MemoryLedger::new();
    let mut session = TradingSession::new(config, day, &day_ledger)?;

    match session.replay_candles(candles, chain, &indicators) {
        Ok(()) => {}
        Err(OrbError::DataGap(gap)) => {
            warn!(%day, %gap, "data gap; day skipped");
            return Ok(DayResult::skipped(day, gap.to_string(), candles.len()));
        }
        Err(other) => return Err(other.into()),
    }

    let abandoned = session.abandoned_entries().len();
    let trades = session.into_trades();
    ledger.append_all(trades.clone());

    let result = DayResult::completed(day, trades, candles.len(), abandoned);
    info!(
        %day,
        trades = result.trade_count(),
        net = result.net_pnl,
        "day completed"
    );
    Ok(result)
}

/// Run every day in `days` and aggregate the results.
pub fn run_backtest(
    config: &StrategyConfig,
    days: &DayCandles,
    chain: &dyn OptionChain,
    ledger: &dyn TradeLedger,
    opts: &BacktestOptions,
) -> Result<BacktestReport, RunError> {
    config.validate()?;
    if days.is_empty() {
        return Err(RunError::NoData);
    }

    let mut jobs: Vec<(NaiveDate, &[Candle], &[Candle])> = Vec::with_capacity(days.len());
    let mut previous: &[Candle] = &[];
    for (day, candles) in days {
        let warmup = &previous[previous.len().saturating_sub(opts.warmup_candles)..];
        jobs.push((*day, candles.as_slice(), warmup));
        previous = candles.as_slice();
    }

    let run = |(day, candles, warmup): &(NaiveDate, &[Candle], &[Candle])| {
        run_day(config, *day, candles, warmup, chain, ledger)
    };
    let results: Vec<DayResult> = if opts.parallel {
        jobs.par_iter().map(run).collect::<Result<_, _>>()?
    } else {
        jobs.iter().map(run).collect::<Result<_, _>>()?
    };

    let metrics = PerformanceMetrics::compute(&results, opts.risk_free_rate);
    info!(
        days = results.len(),
        skipped = results.iter().filter(|d| !d.is_completed()).count(),
        trades = metrics.total_trades,
        net = metrics.net_pnl,
        "backtest finished"
    );

    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        fingerprint: config_fingerprint(config)?,
        dataset_hash: dataset_hash(days),
        config: config.clone(),
        days: results,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::SyntheticChain;
    use crate::data_loader::synthetic_days;
    use chrono::NaiveTime;

    fn week() -> DayCandles {
        synthetic_days(
            "backtest",
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            22_000.0,
            NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
        )
    }

    #[test]
    fn parallel_and_sequential_runs_agree() {
        let days = week();
        let chain = SyntheticChain::from_candles("NIFTY", days.values().flatten());
        let config = StrategyConfig::original();

        let par_ledger = MemoryLedger::new();
        let par = run_backtest(&config, &days, &chain, &par_ledger, &BacktestOptions::default()).unwrap();
        let seq_ledger = MemoryLedger::new();
        let seq_opts = BacktestOptions {
            parallel: false,
            ..BacktestOptions::default()
        };
        let seq = run_backtest(&config, &days, &chain, &seq_ledger, &seq_opts).unwrap();

        assert_eq!(par.days, seq.days);
        assert_eq!(par.days.len(), 5);
        assert_eq!(par_ledger.len(), par.trades().count());
        assert_eq!(seq_ledger.records(), seq.trades().cloned().collect::<Vec<_>>());
        assert_eq!(par.fingerprint, seq.fingerprint);
    }

    #[test]
    fn gap_day_is_skipped_and_others_complete() {
        let mut days = week();
        let broken = *days.keys().nth(2).unwrap();
        days.get_mut(&broken).unwrap().remove(40);

        let chain = SyntheticChain::from_candles("NIFTY", days.values().flatten());
        let ledger = MemoryLedger::new();
        let report = run_backtest(
            &StrategyConfig::tuned(),
            &days,
            &chain,
            &ledger,
            &BacktestOptions::default(),
        )
        .unwrap();

        let skipped: Vec<_> = report.skipped_days().collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].day, broken);
        assert!(skipped[0].trades.is_empty());
        assert!(matches!(&skipped[0].status, DayStatus::Skipped { reason } if reason.contains("gap")));
        assert_eq!(report.days.iter().filter(|d| d.is_completed()).count(), 4);
        assert_eq!(report.metrics.skipped_days, 1);
    }

    #[test]
    fn invalid_config_is_fatal() {
        let days = week();
        let chain = SyntheticChain::from_candles("NIFTY", days.values().flatten());
        let mut config = StrategyConfig::original();
        config.session.orb_candles = 0;
        let err = run_backtest(&config, &days, &chain, &MemoryLedger::new(), &BacktestOptions::default())
            .unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }

    #[test]
    fn empty_input_is_an_error() {
        let chain = SyntheticChain::default();
        let err = run_backtest(
            &StrategyConfig::original(),
            &DayCandles::new(),
            &chain,
            &MemoryLedger::new(),
            &BacktestOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RunError::NoData));
    }

    #[test]
    fn day_totals_match_trades() {
        let days = week();
        let chain = SyntheticChain::from_candles("NIFTY", days.values().flatten());
        let mut config = StrategyConfig::original();
        config.filter.rsi_enabled = false;
        config.filter.supertrend_enabled = false;
        let report = run_backtest(&config, &days, &chain, &MemoryLedger::new(), &BacktestOptions::default()).unwrap();
        for day in &report.days {
            let net: f64 = day.trades.iter().map(|t| t.net_pnl).sum();
            assert!((day.net_pnl - net).abs() < 1e-9);
            assert!(day.charges >= 0.0);
            assert!(day.trades.iter().all(|t| t.trading_day == day.day));
        }
    }
}
