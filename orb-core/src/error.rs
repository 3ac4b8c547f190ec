//! Error types for the strategy engine.
//!
//! `ConfigError` fails fast at startup. `DataGapError` aborts the current
//! trading day; the orchestrating caller flags the day and moves on.
//! `InstrumentNotFoundError` abandons a single entry attempt. Invariant
//! violations are fatal and never auto-corrected.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::domain::{OptionRight, PositionId, PositionStatus};

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("orb_candles must be >= 1, got {0}")]
    OrbCandles(usize),
    #[error("ladder must have exactly 5 steps, got {0}")]
    LadderLength(usize),
    #[error("ladder step T{index} = {value} must be positive and greater than the previous step")]
    LadderNotAscending { index: usize, value: f64 },
    #[error("max_reentries must be >= 0, got {0}")]
    NegativeReentries(i32),
    #[error("rsi band [{low}, {high}] must satisfy 0 <= low <= high <= 100")]
    RsiBand { low: f64, high: f64 },
    #[error("{name} period must be >= 1")]
    IndicatorPeriod { name: &'static str },
    #[error("supertrend multiplier must be positive, got {0}")]
    SupertrendMultiplier(f64),
    #[error("no_entry_after ({no_entry_after}) must not be later than force_exit_time ({force_exit_time})")]
    EntryCutoffAfterForceExit {
        no_entry_after: NaiveTime,
        force_exit_time: NaiveTime,
    },
    #[error("force_exit_time ({force_exit_time}) must be after market_open ({market_open})")]
    ForceExitBeforeOpen {
        force_exit_time: NaiveTime,
        market_open: NaiveTime,
    },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },
}

/// Missing, out-of-order or malformed market data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataGapError {
    #[error("candle at {got} is not after previous candle at {previous}")]
    OutOfOrder {
        previous: NaiveDateTime,
        got: NaiveDateTime,
    },
    #[error("gap of {minutes} minutes between {previous} and {got}")]
    MissingCandles {
        previous: NaiveDateTime,
        got: NaiveDateTime,
        minutes: i64,
    },
    #[error("candle at {got} belongs to a different trading day than {day}")]
    WrongDay { day: NaiveDate, got: NaiveDateTime },
    #[error("malformed candle at {0}")]
    MalformedCandle(NaiveDateTime),
    #[error("malformed premium {premium} for {symbol} at {at}")]
    MalformedPremium {
        symbol: String,
        at: NaiveDateTime,
        premium: f64,
    },
    #[error("premium tick for {symbol} at {got} is older than {previous}")]
    StaleTick {
        symbol: String,
        previous: NaiveDateTime,
        got: NaiveDateTime,
    },
    #[error("no premium for {symbol} at {at}")]
    MissingPremium { symbol: String, at: NaiveDateTime },
}

/// The option chain has no tradable contract for a selection.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no tradable {right} at strike {strike} expiring {expiry}")]
pub struct InstrumentNotFoundError {
    pub right: OptionRight,
    pub strike: f64,
    pub expiry: NaiveDate,
}

/// Top-level engine error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrbError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data gap: {0}")]
    DataGap(#[from] DataGapError),
    #[error("instrument not found: {0}")]
    InstrumentNotFound(#[from] InstrumentNotFoundError),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl OrbError {
    /// A position received an event its status cannot accept.
    pub fn unexpected_event(id: &PositionId, status: PositionStatus, event: &str) -> Self {
        OrbError::InvariantViolation(format!("position {id} in status {status:?} received {event}"))
    }
}
