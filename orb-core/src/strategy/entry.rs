//! Entry trigger: the underlying crossing the breakout candle's extreme.

use crate::domain::{BreakoutEvent, Candle, Direction};

/// Underlying price at which the entry level was crossed on this candle.
///
/// CALL crosses when `high >= H1`, PUT when `low <= L1`. A candle that opens
/// beyond the level crosses at its open.
pub fn check_entry(direction: Direction, candle: &Candle, h1: f64, l1: f64) -> Option<f64> {
    match direction {
        Direction::Call if candle.high >= h1 => Some(candle.open.max(h1)),
        Direction::Put if candle.low <= l1 => Some(candle.open.min(l1)),
        _ => None,
    }
}

/// Walk the candle's assumed intra-candle path and report whether the
/// structural stop is touched before the entry level.
pub fn stop_touched_first(breakout: &BreakoutEvent, candle: &Candle) -> bool {
    let entry = breakout.entry_level();
    let stop = breakout.stop_level();
    for price in candle.synthetic_path() {
        let (stop_hit, entry_hit) = match breakout.direction {
            Direction::Call => (price <= stop, price >= entry),
            Direction::Put => (price >= stop, price <= entry),
        };
        if stop_hit {
            return true;
        }
        if entry_hit {
            return false;
        }
    }
    false
}

/// Underlying price at which a Regime A structural stop was breached on this
/// candle, or `None` if it held.
pub fn structural_breach(breakout: &BreakoutEvent, candle: &Candle) -> Option<f64> {
    let stop = breakout.stop_level();
    match breakout.direction {
        Direction::Call if candle.low <= stop => Some(candle.open.min(stop)),
        Direction::Put if candle.high >= stop => Some(candle.open.max(stop)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OpeningRange;
    use chrono::NaiveDate;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 25, 0)
            .unwrap();
        Candle::new(ts, open, high, low, close)
    }

    fn breakout(direction: Direction) -> BreakoutEvent {
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
    fn call_crosses_at_h1() {
        assert_eq!(check_entry(Direction::Call, &candle(100.0, 103.0, 99.0, 102.5), 102.0, 96.0), Some(102.0));
        assert_eq!(check_entry(Direction::Call, &candle(100.0, 101.9, 99.0, 101.0), 102.0, 96.0), None);
    }

    #[test]
    fn gap_open_crosses_at_open() {
        assert_eq!(check_entry(Direction::Call, &candle(104.0, 105.0, 103.0, 104.5), 102.0, 96.0), Some(104.0));
        assert_eq!(check_entry(Direction::Put, &candle(94.0, 95.0, 93.0, 94.0), 102.0, 96.0), Some(94.0));
    }

    #[test]
    fn put_crosses_at_l1() {
        assert_eq!(check_entry(Direction::Put, &candle(98.0, 99.0, 95.0, 97.0), 102.0, 96.0), Some(96.0));
    }

    #[test]
    fn bearish_candle_touches_stop_first_for_call() {
        // bearish path O,H,L,C: 101 → 103 hits entry before the low
        assert!(!stop_touched_first(&breakout(Direction::Call), &candle(101.0, 103.0, 95.0, 97.0)));
        // bullish path O,L,H,C: 101 → 95 hits stop before high
        assert!(stop_touched_first(&breakout(Direction::Call), &candle(101.0, 103.0, 95.0, 102.5)));
    }

    #[test]
    fn structural_breach_levels() {
        let call = breakout(Direction::Call);
        assert_eq!(structural_breach(&call, &candle(98.0, 99.0, 95.5, 97.0)), Some(96.0));
        assert_eq!(structural_breach(&call, &candle(95.0, 96.0, 94.0, 95.0)), Some(95.0));
        assert_eq!(structural_breach(&call, &candle(98.0, 99.0, 96.5, 97.0)), None);

        let put = breakout(Direction::Put);
        assert_eq!(structural_breach(&put, &candle(101.0, 102.5, 100.0, 102.0)), Some(102.0));
    }
}
