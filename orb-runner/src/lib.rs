//! ORB Runner — multi-day orchestration on top of `orb-core`.
//!
//! This crate provides:
//! - TOML strategy configs with blake3 fingerprints
//! - Candle and premium CSV loading, plus seeded synthetic days
//! - Historical and synthetic option chains
//! - Parallel multi-day backtests with per-day skip reporting
//! - Performance metrics (win rate, drawdown, Sharpe, streaks)
//! - Parameter sweeps ranked by net P&L
//! - Trade ledger and report export (CSV / JSON)

pub mod backtest;
pub mod chain;
pub mod config;
pub mod data_loader;
pub mod error;
pub mod export;
pub mod metrics;
pub mod sweep;

#[cfg(test)]
pub(crate) mod testutil;

pub use backtest::{
    run_backtest, run_day, BacktestOptions, BacktestReport, DayResult, DayStatus, SCHEMA_VERSION,
};
pub use chain::{HistoricalChain, SyntheticChain};
pub use config::{config_fingerprint, load_config, parse_config, render_config};
pub use data_loader::{
    dataset_hash, load_candles_csv, load_premiums_csv, synthetic_days, write_candles_csv,
    DayCandles,
};
pub use error::RunError;
pub use export::{load_artifacts, save_artifacts};
pub use metrics::PerformanceMetrics;
pub use sweep::{run_sweep, SweepEntry, SweepGrid, SweepPoint, SweepResults};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<BacktestReport>();
        assert_sync::<BacktestReport>();
        assert_send::<DayResult>();
        assert_sync::<DayResult>();
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn chains_are_send_sync() {
        assert_send::<HistoricalChain>();
        assert_sync::<HistoricalChain>();
        assert_send::<SyntheticChain>();
        assert_sync::<SyntheticChain>();
    }

    #[test]
    fn sweep_types_are_send_sync() {
        assert_send::<SweepGrid>();
        assert_sync::<SweepGrid>();
        assert_send::<SweepResults>();
        assert_sync::<SweepResults>();
    }

    #[test]
    fn run_error_is_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
