//! Performance metrics — pure functions over day results and trade lists.
//!
//! P&L figures are in rupees. Daily series cover completed days only;
//! skipped days contribute nothing.

use serde::{Deserialize, Serialize};

use orb_core::domain::TradeRecord;

use crate::backtest::DayResult;

/// Annual risk-free rate used for the Sharpe ratio unless overridden.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.065;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Aggregate performance metrics for a multi-day run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_days: usize,
    pub skipped_days: usize,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub gross_pnl: f64,
    pub net_pnl: f64,
    pub total_charges: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub reward_to_risk: f64,
    pub profit_factor: f64,
    /// Largest peak-to-trough fall of cumulative daily net P&L (positive).
    pub max_drawdown: f64,
    pub sharpe: f64,
    pub avg_daily_pnl: f64,
    pub daily_pnl_std: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl PerformanceMetrics {
    pub fn compute(days: &[DayResult], risk_free_rate: f64) -> Self {
        let completed: Vec<&DayResult> = days.iter().filter(|d| d.is_completed()).collect();
        let trades: Vec<&TradeRecord> = completed.iter().flat_map(|d| d.trades.iter()).collect();
        let daily = daily_net_pnls(days);

        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        let avg_win = avg_win(&trades);
        let avg_loss = avg_loss(&trades);

        Self {
            total_days: completed.len(),
            skipped_days: days.len() - completed.len(),
            total_trades: trades.len(),
            winning_trades,
            losing_trades: trades.len() - winning_trades,
            win_rate: win_rate(&trades),
            gross_pnl: trades.iter().map(|t| t.gross_pnl).sum(),
            net_pnl: trades.iter().map(|t| t.net_pnl).sum(),
            total_charges: trades.iter().map(|t| t.total_fees()).sum(),
            avg_win,
            avg_loss,
            reward_to_risk: if avg_loss == 0.0 { 0.0 } else { (avg_win / avg_loss).abs() },
            profit_factor: profit_factor(&trades),
            max_drawdown: max_drawdown(&daily),
            sharpe: sharpe_ratio(&daily, risk_free_rate),
            avg_daily_pnl: mean_f64(&daily),
            daily_pnl_std: std_dev(&daily),
            max_consecutive_wins: max_consecutive(&trades, true),
            max_consecutive_losses: max_consecutive(&trades, false),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Net P&L of each completed day, in day order.
pub fn daily_net_pnls(days: &[DayResult]) -> Vec<f64> {
    days.iter().filter(|d| d.is_completed()).map(|d| d.net_pnl).collect()
}

/// Fraction of trades with positive net P&L.
pub fn win_rate(trades: &[&TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Mean net P&L of winning trades.
pub fn avg_win(trades: &[&TradeRecord]) -> f64 {
    let wins: Vec<f64> = trades.iter().filter(|t| t.net_pnl > 0.0).map(|t| t.net_pnl).collect();
    mean_f64(&wins)
}

/// Mean net P&L of non-winning trades (zero or negative).
pub fn avg_loss(trades: &[&TradeRecord]) -> f64 {
    let losses: Vec<f64> = trades.iter().filter(|t| t.net_pnl <= 0.0).map(|t| t.net_pnl).collect();
    mean_f64(&losses)
}

/// Profit factor: gross winning net P&L / gross losing net P&L.
///
/// Capped at 100.0 for edge cases (all winners, zero losses).
pub fn profit_factor(trades: &[&TradeRecord]) -> f64 {
    let gross_profit: f64 = trades.iter().filter(|t| t.net_pnl > 0.0).map(|t| t.net_pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl <= 0.0)
        .map(|t| t.net_pnl.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Maximum drawdown of the cumulative P&L curve, in absolute terms.
///
/// The curve starts at zero, so a losing first day is already a drawdown.
pub fn max_drawdown(daily_pnls: &[f64]) -> f64 {
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for pnl in daily_pnls {
        cumulative += pnl;
        peak = peak.max(cumulative);
        max_dd = max_dd.max(peak - cumulative);
    }
    max_dd
}

/// Annualised Sharpe ratio of daily P&L.
///
/// Sharpe = (mean(daily) - rf / 252) / std(daily) * sqrt(252).
/// Returns 0.0 with fewer than two days or zero variance.
pub fn sharpe_ratio(daily_pnls: &[f64], risk_free_rate: f64) -> f64 {
    if daily_pnls.len() < 2 {
        return 0.0;
    }
    let std = std_dev(daily_pnls);
    if std < 1e-15 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    (mean_f64(daily_pnls) - daily_rf) / std * TRADING_DAYS_PER_YEAR.sqrt()
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn max_consecutive(trades: &[&TradeRecord], winners: bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for trade in trades {
        if trade.is_winner() == winners {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}
