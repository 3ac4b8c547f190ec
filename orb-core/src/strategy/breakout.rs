//! Breakout Detector — first close beyond H3 (CALL) or L3 (PUT) of the day.

use tracing::info;

use crate::domain::{BreakoutEvent, Candle, Direction, OpeningRange};

/// Establishes at most one CALL and one PUT breakout structure per day.
///
/// The detector remembers the previous candle (including the last range
/// candle) so the opposite-side level can be taken from it. Once a
/// direction's H1/L1 are set they never change.
#[derive(Debug, Clone, Default)]
pub struct BreakoutDetector {
    previous: Option<(f64, f64)>,
    index: usize,
    recorded: [Option<BreakoutEvent>; 2],
}

impl BreakoutDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a candle as "previous" without evaluating it (range candles).
    pub fn remember(&mut self, candle: &Candle) {
        self.previous = Some((candle.high, candle.low));
        self.index += 1;
    }

    /// Evaluate a post-range candle on close.
    ///
    /// CALL is checked before PUT. A single candle cannot close both above
    /// H3 and below L3, so at most one event is returned.
    pub fn observe(&mut self, candle: &Candle, range: &OpeningRange) -> Option<BreakoutEvent> {
        let candle_index = self.index;
        let mut emitted = None;

        for direction in Direction::ALL {
            if self.recorded[direction.index()].is_some() {
                continue;
            }
            let (prev_high, prev_low) = self.previous.unwrap_or((range.h3, range.l3));
            let event = match direction {
                Direction::Call if candle.close > range.h3 => BreakoutEvent {
                    direction,
                    h1: candle.high,
                    l1: prev_low,
                    breakout_candle_index: candle_index,
                    confirmed_at: candle.timestamp,
                    range: *range,
                },
                Direction::Put if candle.close < range.l3 => BreakoutEvent {
                    direction,
                    h1: prev_high,
                    l1: candle.low,
                    breakout_candle_index: candle_index,
                    confirmed_at: candle.timestamp,
                    range: *range,
                },
                _ => continue,
            };
            info!(
                direction = %direction,
                h1 = event.h1,
                l1 = event.l1,
                at = %candle.timestamp,
                "breakout confirmed"
            );
            self.recorded[direction.index()] = Some(event);
            emitted = Some(event);
            break;
        }

        self.remember(candle);
        emitted
    }

    /// Breakout structure for a direction, if established today.
    pub fn breakout(&self, direction: Direction) -> Option<BreakoutEvent> {
        self.recorded[direction.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn candle(minute: u32, open: f64, high: f64, low: f64, close: f64) -> Candle {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 15 + minute, 0)
            .unwrap();
        Candle::new(ts, open, high, low, close)
    }

    fn range() -> OpeningRange {
        OpeningRange {
            h3: 100.0,
            l3: 95.0,
            candle_count: 3,
        }
    }

    #[test]
    fn call_breakout_takes_previous_low() {
        let mut det = BreakoutDetector::new();
        det.remember(&candle(0, 97.0, 99.0, 96.5, 98.0));
        det.remember(&candle(1, 98.0, 100.0, 97.0, 99.0));
        det.remember(&candle(2, 99.0, 99.5, 96.0, 97.0));
        let ev = det.observe(&candle(3, 97.5, 102.0, 97.0, 101.0), &range()).unwrap();
        assert_eq!(ev.direction, Direction::Call);
        assert_eq!(ev.h1, 102.0);
        assert_eq!(ev.l1, 96.0);
        assert_eq!(ev.breakout_candle_index, 3);
    }

    #[test]
    fn put_breakout_takes_previous_high() {
        let mut det = BreakoutDetector::new();
        det.remember(&candle(2, 97.0, 98.5, 95.5, 96.0));
        let ev = det.observe(&candle(3, 96.0, 96.5, 93.0, 94.0), &range()).unwrap();
        assert_eq!(ev.direction, Direction::Put);
        assert_eq!(ev.h1, 98.5);
        assert_eq!(ev.l1, 93.0);
    }

    #[test]
    fn each_direction_fires_once() {
        let mut det = BreakoutDetector::new();
        det.remember(&candle(2, 97.0, 98.0, 96.0, 97.0));
        let first = det.observe(&candle(3, 99.0, 102.0, 98.0, 101.0), &range()).unwrap();
        assert!(det.observe(&candle(4, 101.0, 108.0, 100.0, 107.0), &range()).is_none());
        assert_eq!(det.breakout(Direction::Call), Some(first));

        let put = det.observe(&candle(5, 96.0, 97.0, 90.0, 91.0), &range()).unwrap();
        assert_eq!(put.direction, Direction::Put);
        assert_eq!(put.h1, 108.0);
        assert_eq!(det.breakout(Direction::Call).unwrap().h1, 102.0);
    }

    #[test]
    fn close_at_range_edge_is_not_a_breakout() {
        let mut det = BreakoutDetector::new();
        assert!(det.observe(&candle(3, 99.0, 103.0, 94.0, 100.0), &range()).is_none());
        assert!(det.observe(&candle(4, 99.0, 100.0, 94.0, 95.0), &range()).is_none());
    }

    #[test]
    fn missing_previous_falls_back_to_range() {
        let mut det = BreakoutDetector::new();
        let ev = det.observe(&candle(3, 99.0, 102.0, 98.0, 101.0), &range()).unwrap();
        assert_eq!(ev.l1, 95.0);
    }
}
