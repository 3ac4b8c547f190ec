//! Option Selector — ITM strike, weekly expiry and chain lookup.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

use crate::config::InstrumentConfig;
use crate::domain::{Direction, Instrument};
use crate::error::InstrumentNotFoundError;

/// Injected option chain: instrument resolution plus premium lookup.
pub trait OptionChain: Send + Sync {
    /// Tradable contract for (right, strike, expiry), if the chain lists one.
    fn resolve(&self, direction: Direction, strike: f64, expiry: NaiveDate) -> Option<Instrument>;

    /// Premium of `instrument` at `at`, if quoted.
    fn premium_at(&self, instrument: &Instrument, at: NaiveDateTime) -> Option<f64>;
}

/// In-the-money strike: spot rounded to the strike step, shifted by the offset
/// (CE below spot, PE above).
pub fn select_strike(direction: Direction, spot: f64, strike_step: f64, itm_offset: f64) -> f64 {
    let atm = (spot / strike_step).round() * strike_step;
    match direction {
        Direction::Call => atm - itm_offset,
        Direction::Put => atm + itm_offset,
    }
}

/// Nearest weekly expiry (Thursday) on or after `day`.
pub fn nearest_expiry(day: NaiveDate) -> NaiveDate {
    let today = day.weekday().num_days_from_monday() as i64;
    let thursday = Weekday::Thu.num_days_from_monday() as i64;
    day + Duration::days((thursday - today).rem_euclid(7))
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionSelector {
    strike_step: f64,
    itm_offset: f64,
}

impl OptionSelector {
    pub fn new(config: &InstrumentConfig) -> Self {
        Self {
            strike_step: config.strike_step,
            itm_offset: config.itm_offset,
        }
    }

    /// Resolve the contract to trade for a crossing at `spot` on `day`.
    pub fn select(
        &self,
        direction: Direction,
        spot: f64,
        day: NaiveDate,
        chain: &dyn OptionChain,
    ) -> Result<Instrument, InstrumentNotFoundError> {
        let strike = select_strike(direction, spot, self.strike_step, self.itm_offset);
        let expiry = nearest_expiry(day);
        let not_found = InstrumentNotFoundError {
            right: direction.right(),
            strike,
            expiry,
        };
        if !(strike > 0.0) {
            return Err(not_found);
        }
        chain.resolve(direction, strike, expiry).ok_or(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OptionRight;

    struct ListedChain(Vec<f64>);

    impl OptionChain for ListedChain {
        fn resolve(&self, direction: Direction, strike: f64, expiry: NaiveDate) -> Option<Instrument> {
            self.0
                .contains(&strike)
                .then(|| Instrument::new("NIFTY", direction.right(), strike, expiry))
        }

        fn premium_at(&self, _instrument: &Instrument, _at: NaiveDateTime) -> Option<f64> {
            None
        }
    }

    #[test]
    fn itm_strike_rule() {
        assert_eq!(select_strike(Direction::Call, 24_700.0, 100.0, 200.0), 24_500.0);
        assert_eq!(select_strike(Direction::Put, 24_700.0, 100.0, 200.0), 24_900.0);
        assert_eq!(select_strike(Direction::Call, 24_649.0, 100.0, 200.0), 24_400.0);
        assert_eq!(select_strike(Direction::Call, 101.0, 100.0, 200.0), -100.0);
    }

    #[test]
    fn expiry_is_next_thursday() {
        let tue = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(nearest_expiry(tue), NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        let thu = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        assert_eq!(nearest_expiry(thu), thu);
        let fri = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(nearest_expiry(fri), NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
    }

    #[test]
    fn selector_resolves_listed_strike() {
        let selector = OptionSelector::new(&InstrumentConfig::default());
        let chain = ListedChain(vec![24_500.0]);
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let inst = selector.select(Direction::Call, 24_700.0, day, &chain).unwrap();
        assert_eq!(inst.symbol(), "NIFTY24500CE");

        let err = selector.select(Direction::Put, 24_700.0, day, &chain).unwrap_err();
        assert_eq!(err.right, OptionRight::Pe);
        assert_eq!(err.strike, 24_900.0);
    }

    #[test]
    fn non_positive_strike_is_not_found() {
        let selector = OptionSelector::new(&InstrumentConfig::default());
        let chain = ListedChain(vec![-100.0]);
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(selector.select(Direction::Call, 101.0, day, &chain).is_err());
    }
}
