//! Parameter sweep over the published grid.
//!
//! Grid: ITM offset {100, 200, 300} × entry cutoff {11:00, 11:30, 12:00,
//! 13:00} × opening-range candles {3, 5, 10} × force exit {15:00, 15:15} ×
//! ladder (T1, step) {(30, 30), (40, 40), (50, 50)} = 216 configurations,
//! each applied on top of a base config and evaluated in parallel.

use chrono::NaiveTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use orb_core::config::Ladder;
use orb_core::strategy::OptionChain;
use orb_core::{MemoryLedger, StrategyConfig};

use crate::backtest::{run_backtest, BacktestOptions};
use crate::data_loader::DayCandles;
use crate::error::RunError;
use crate::metrics::PerformanceMetrics;

/// Grid axes. Every combination is one sweep point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepGrid {
    pub itm_offsets: Vec<f64>,
    pub entry_cutoffs: Vec<NaiveTime>,
    pub orb_candles: Vec<usize>,
    pub force_exits: Vec<NaiveTime>,
    /// (T1, step) pairs for uniform ladders.
    pub ladders: Vec<(f64, f64)>,
}

impl Default for SweepGrid {
    fn default() -> Self {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);
        Self {
            itm_offsets: vec![100.0, 200.0, 300.0],
            entry_cutoffs: vec![t(11, 0), t(11, 30), t(12, 0), t(13, 0)],
            orb_candles: vec![3, 5, 10],
            force_exits: vec![t(15, 0), t(15, 15)],
            ladders: vec![(30.0, 30.0), (40.0, 40.0), (50.0, 50.0)],
        }
    }
}

/// One grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub itm_offset: f64,
    pub entry_cutoff: NaiveTime,
    pub orb_candles: usize,
    pub force_exit: NaiveTime,
    pub ladder_t1: f64,
    pub ladder_step: f64,
}

impl SweepPoint {
    /// `base` with this point's parameters applied.
    pub fn apply(&self, base: &StrategyConfig) -> StrategyConfig {
        let mut config = base.clone();
        config.instrument.itm_offset = self.itm_offset;
        config.session.no_entry_after = self.entry_cutoff;
        config.session.orb_candles = self.orb_candles;
        config.session.force_exit_time = self.force_exit;
        config.ladder = Ladder::uniform(self.ladder_t1, self.ladder_step);
        config
    }

    /// Short label, e.g. `ITM200_cut11:30_orb3_fx15:15_L30/30`.
    pub fn label(&self) -> String {
        format!(
            "ITM{:.0}_cut{}_orb{}_fx{}_L{:.0}/{:.0}",
            self.itm_offset,
            self.entry_cutoff.format("%H:%M"),
            self.orb_candles,
            self.force_exit.format("%H:%M"),
            self.ladder_t1,
            self.ladder_step
        )
    }
}

impl SweepGrid {
    pub fn size(&self) -> usize {
        self.itm_offsets.len()
            * self.entry_cutoffs.len()
            * self.orb_candles.len()
            * self.force_exits.len()
            * self.ladders.len()
    }

    /// Every point in the grid, in axis order.
    pub fn points(&self) -> Vec<SweepPoint> {
        let mut points = Vec::with_capacity(self.size());
        for &itm_offset in &self.itm_offsets {
            for &entry_cutoff in &self.entry_cutoffs {
                for &orb_candles in &self.orb_candles {
                    for &force_exit in &self.force_exits {
                        for &(ladder_t1, ladder_step) in &self.ladders {
                            points.push(SweepPoint {
                                itm_offset,
                                entry_cutoff,
                                orb_candles,
                                force_exit,
                                ladder_t1,
                                ladder_step,
                            });
                        }
                    }
                }
            }
        }
        points
    }
}

/// Metrics of one evaluated sweep point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepEntry {
    pub point: SweepPoint,
    pub label: String,
    pub fingerprint: String,
    pub metrics: PerformanceMetrics,
}

/// Sweep results, best net P&L first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepResults {
    entries: Vec<SweepEntry>,
}

impl SweepResults {
    fn ranked(mut entries: Vec<SweepEntry>) -> Self {
        entries.sort_by(|a, b| {
            b.metrics
                .net_pnl
                .partial_cmp(&a.metrics.net_pnl)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.label.cmp(&b.label))
        });
        Self { entries }
    }

    pub fn all(&self) -> &[SweepEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<&SweepEntry> {
        self.entries.first()
    }

    /// The top `n` entries with at least `min_trades` trades.
    pub fn top_n(&self, n: usize, min_trades: usize) -> Vec<&SweepEntry> {
        self.entries
            .iter()
            .filter(|e| e.metrics.total_trades >= min_trades)
            .take(n)
            .collect()
    }
}

/// Evaluate every grid point on the same data.
///
/// Points run in parallel; days within a point run sequentially.
pub fn run_sweep(
    base: &StrategyConfig,
    grid: &SweepGrid,
    days: &DayCandles,
    chain: &dyn OptionChain,
    opts: &BacktestOptions,
) -> Result<SweepResults, RunError> {
    let points = grid.points();
    info!(points = points.len(), days = days.len(), "sweep started");

    let day_opts = BacktestOptions {
        parallel: false,
        ..opts.clone()
    };
    let entries = points
        .par_iter()
        .map(|point| {
            let config = point.apply(base);
            let report = run_backtest(&config, days, chain, &MemoryLedger::new(), &day_opts)?;
            Ok(SweepEntry {
                point: *point,
                label: point.label(),
                fingerprint: report.fingerprint,
                metrics: report.metrics,
            })
        })
        .collect::<Result<Vec<_>, RunError>>()?;

    let results = SweepResults::ranked(entries);
    if let Some(best) = results.best() {
        info!(best = %best.label, net = best.metrics.net_pnl, "sweep finished");
    }
    Ok(results)
}
