//! Candle — the fundamental market data unit for the underlying index.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One-minute OHLC candle for the underlying index.
///
/// Timestamps are exchange-local (IST) and mark the start of the minute.
/// Within a session, timestamps are strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

impl Candle {
    pub fn new(timestamp: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: 0,
        }
    }

    /// Trading day this candle belongs to.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Intra-candle price path used when only OHLC is known.
    ///
    /// Bullish candles are assumed to trade O → L → H → C, bearish ones
    /// O → H → L → C.
    pub fn synthetic_path(&self) -> [f64; 4] {
        if self.is_bullish() {
            [self.open, self.low, self.high, self.close]
        } else {
            [self.open, self.high, self.low, self.close]
        }
    }
}
