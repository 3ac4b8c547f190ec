//! Entry Filter — RSI band and SuperTrend agreement, evaluated at trigger time.
//!
//! Indicator values are an injected capability (`IndicatorSource`); the
//! filter never computes them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::FilterConfig;
use crate::domain::Direction;

/// SuperTrend state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

impl TrendDirection {
    /// Whether this trend agrees with a breakout direction.
    pub fn agrees_with(self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (TrendDirection::Up, Direction::Call) | (TrendDirection::Down, Direction::Put)
        )
    }
}

/// Time-series lookup for indicator values at a candle timestamp.
pub trait IndicatorSource: Send + Sync {
    fn rsi(&self, at: NaiveDateTime) -> Option<f64>;
    fn supertrend(&self, at: NaiveDateTime) -> Option<TrendDirection>;
}

/// Constant indicator values, for tests and for runs with filters disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedIndicators {
    pub rsi: Option<f64>,
    pub trend: Option<TrendDirection>,
}

impl FixedIndicators {
    pub fn new(rsi: f64, trend: TrendDirection) -> Self {
        Self {
            rsi: Some(rsi),
            trend: Some(trend),
        }
    }
}

impl IndicatorSource for FixedIndicators {
    fn rsi(&self, _at: NaiveDateTime) -> Option<f64> {
        self.rsi
    }

    fn supertrend(&self, _at: NaiveDateTime) -> Option<TrendDirection> {
        self.trend
    }
}

/// Gate applied once, when an entry trigger fires.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryFilter {
    rsi_enabled: bool,
    rsi_low: f64,
    rsi_high: f64,
    supertrend_enabled: bool,
}

impl EntryFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            rsi_enabled: config.rsi_enabled,
            rsi_low: config.rsi_low,
            rsi_high: config.rsi_high,
            supertrend_enabled: config.supertrend_enabled,
        }
    }

    /// A filter that passes everything.
    pub fn disabled() -> Self {
        Self {
            rsi_enabled: false,
            rsi_low: 0.0,
            rsi_high: 100.0,
            supertrend_enabled: false,
        }
    }

    /// The RSI band is shared by both directions. An enabled gate with no
    /// value available (indicator still warming up) rejects.
    pub fn allow(
        &self,
        direction: Direction,
        rsi: Option<f64>,
        supertrend: Option<TrendDirection>,
    ) -> bool {
        if self.rsi_enabled {
            match rsi {
                Some(v) if v >= self.rsi_low && v <= self.rsi_high => {}
                _ => return false,
            }
        }
        if self.supertrend_enabled {
            match supertrend {
                Some(trend) if trend.agrees_with(direction) => {}
                _ => return false,
            }
        }
        true
    }
}
