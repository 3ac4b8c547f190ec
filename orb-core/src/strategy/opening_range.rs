//! Opening Range Tracker — high/low of the first N candles of the session.

use crate::domain::{Candle, OpeningRange};
use crate::error::ConfigError;

/// Accumulates H3/L3 over exactly `orb_candles` observations, then freezes.
#[derive(Debug, Clone)]
pub struct OpeningRangeTracker {
    target: usize,
    seen: usize,
    high: f64,
    low: f64,
    range: Option<OpeningRange>,
}

impl OpeningRangeTracker {
    pub fn new(orb_candles: usize) -> Result<Self, ConfigError> {
        if orb_candles < 1 {
            return Err(ConfigError::OrbCandles(orb_candles));
        }
        Ok(Self {
            target: orb_candles,
            seen: 0,
            high: f64::NEG_INFINITY,
            low: f64::INFINITY,
            range: None,
        })
    }

    /// Feed one candle. Returns the range only on the Nth observation;
    /// every later call is ignored and returns `None`.
    pub fn observe(&mut self, candle: &Candle) -> Option<OpeningRange> {
        if self.range.is_some() {
            return None;
        }
        self.seen += 1;
        self.high = self.high.max(candle.high);
        self.low = self.low.min(candle.low);

        if self.seen < self.target {
            return None;
        }
        let range = OpeningRange {
            h3: self.high,
            l3: self.low,
            candle_count: self.target,
        };
        self.range = Some(range);
        Some(range)
    }

    /// The frozen range, once complete.
    pub fn range(&self) -> Option<OpeningRange> {
        self.range
    }

    pub fn is_complete(&self) -> bool {
        self.range.is_some()
    }

    /// Candles observed so far (never exceeds N).
    pub fn observed(&self) -> usize {
        self.seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn candle(minute: u32, high: f64, low: f64) -> Candle {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 15 + minute, 0)
            .unwrap();
        Candle::new(ts, (high + low) / 2.0, high, low, (high + low) / 2.0)
    }

    #[test]
    fn range_completes_on_nth_candle() {
        let mut tracker = OpeningRangeTracker::new(3).unwrap();
        assert!(tracker.observe(&candle(0, 99.0, 96.0)).is_none());
        assert!(tracker.observe(&candle(1, 100.0, 97.0)).is_none());
        let range = tracker.observe(&candle(2, 98.0, 95.0)).unwrap();
        assert_eq!(range.h3, 100.0);
        assert_eq!(range.l3, 95.0);
        assert_eq!(range.candle_count, 3);
        assert!(tracker.is_complete());
    }

    #[test]
    fn range_is_frozen_after_completion() {
        let mut tracker = OpeningRangeTracker::new(1).unwrap();
        let first = tracker.observe(&candle(0, 101.0, 99.0)).unwrap();
        assert!(tracker.observe(&candle(1, 150.0, 50.0)).is_none());
        assert_eq!(tracker.range(), Some(first));
        assert_eq!(tracker.observed(), 1);
    }

    #[test]
    fn zero_candles_is_a_config_error() {
        assert_eq!(
            OpeningRangeTracker::new(0).unwrap_err(),
            ConfigError::OrbCandles(0)
        );
    }
}
