//! ORB Core — opening range breakout engine for intraday index options.
//!
//! This crate contains the execution logic shared by backtest and live:
//! - Domain types (candles, instruments, breakout levels, positions, trades)
//! - One parameterised `StrategyConfig` with validation and presets
//! - Opening range, breakout detection, entry trigger and filter
//! - Option selection against an injected chain
//! - Position lifecycle state machine with the premium ratchet
//! - Cost model, trade ledger and the per-day session orchestrator

pub mod config;
pub mod costs;
pub mod domain;
pub mod error;
pub mod events;
pub mod indicators;
pub mod ledger;
pub mod position_management;
pub mod session;
pub mod strategy;

pub use config::StrategyConfig;
pub use error::{ConfigError, DataGapError, InstrumentNotFoundError, OrbError};
pub use ledger::{MemoryLedger, TradeLedger};
pub use session::TradingSession;
