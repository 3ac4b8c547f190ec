//! Price structure for a trading day: the opening range (H3/L3) and the
//! breakout levels (H1/L1) derived from it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::instrument::Direction;

/// High/low of the first `candle_count` candles of the session.
///
/// Immutable once built; one instance per trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningRange {
    pub h3: f64,
    pub l3: f64,
    pub candle_count: usize,
}

impl OpeningRange {
    pub fn width(&self) -> f64 {
        self.h3 - self.l3
    }
}

/// A confirmed breakout of the opening range.
///
/// For CALL: `h1` is the breakout candle's high (entry level) and `l1` the
/// previous candle's low (structural stop). For PUT: `l1` is the breakout
/// candle's low (entry level) and `h1` the previous candle's high.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakoutEvent {
    pub direction: Direction,
    pub h1: f64,
    pub l1: f64,
    /// Index of the breakout candle within the session (0-based, range candles included).
    pub breakout_candle_index: usize,
    pub confirmed_at: NaiveDateTime,
    pub range: OpeningRange,
}

impl BreakoutEvent {
    /// Underlying level whose crossing triggers an entry.
    pub fn entry_level(&self) -> f64 {
        match self.direction {
            Direction::Call => self.h1,
            Direction::Put => self.l1,
        }
    }

    /// Underlying level whose breach stops out a Regime A position.
    pub fn stop_level(&self) -> f64 {
        match self.direction {
            Direction::Call => self.l1,
            Direction::Put => self.h1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(direction: Direction) -> BreakoutEvent {
        BreakoutEvent {
            direction,
            h1: 102.0,
            l1: 96.0,
            breakout_candle_index: 3,
            confirmed_at: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(9, 18, 0)
                .unwrap(),
            range: OpeningRange {
                h3: 100.0,
                l3: 95.0,
                candle_count: 3,
            },
        }
    }

    #[test]
    fn call_levels() {
        let ev = event(Direction::Call);
        assert_eq!(ev.entry_level(), 102.0);
        assert_eq!(ev.stop_level(), 96.0);
    }

    #[test]
    fn put_levels() {
        let ev = event(Direction::Put);
        assert_eq!(ev.entry_level(), 96.0);
        assert_eq!(ev.stop_level(), 102.0);
    }

    #[test]
    fn range_width() {
        assert_eq!(event(Direction::Call).range.width(), 5.0);
    }
}
