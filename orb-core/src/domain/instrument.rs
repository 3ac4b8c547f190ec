//! Breakout direction, option right and the tradable option contract.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a breakout and of the position opened on it.
///
/// Declaration order doubles as the evaluation priority: CALL is always
/// evaluated before PUT when both are candidates on the same candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Call,
    Put,
}

impl Direction {
    /// Both directions in evaluation priority order.
    pub const ALL: [Direction; 2] = [Direction::Call, Direction::Put];

    pub fn right(self) -> OptionRight {
        match self {
            Direction::Call => OptionRight::Ce,
            Direction::Put => OptionRight::Pe,
        }
    }

    /// Slot index used for per-direction arrays.
    pub fn index(self) -> usize {
        match self {
            Direction::Call => 0,
            Direction::Put => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Call => write!(f, "CALL"),
            Direction::Put => write!(f, "PUT"),
        }
    }
}

/// Option right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionRight {
    Ce,
    Pe,
}

impl fmt::Display for OptionRight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionRight::Ce => write!(f, "CE"),
            OptionRight::Pe => write!(f, "PE"),
        }
    }
}

/// An option contract on the underlying index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub underlying: String,
    pub right: OptionRight,
    pub strike: f64,
    pub expiry: NaiveDate,
}

impl Instrument {
    pub fn new(underlying: impl Into<String>, right: OptionRight, strike: f64, expiry: NaiveDate) -> Self {
        Self {
            underlying: underlying.into(),
            right,
            strike,
            expiry,
        }
    }

    /// Trading symbol, e.g. `NIFTY24500CE`.
    pub fn symbol(&self) -> String {
        format!("{}{:.0}{}", self.underlying, self.strike, self.right)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol(), self.expiry)
    }
}
