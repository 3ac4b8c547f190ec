//! Option chain adapters.
//!
//! - [`HistoricalChain`]: per-contract premium series loaded from data.
//! - [`SyntheticChain`]: fixed-delta premium model driven by the underlying,
//!   for running without option data.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};

use orb_core::domain::{Candle, Direction, Instrument, OptionRight};
use orb_core::strategy::OptionChain;

/// Premium sensitivity of the synthetic ITM contract to the underlying.
pub const SYNTHETIC_DELTA: f64 = 0.65;
/// Synthetic premium when the underlying sits at the day's open.
pub const SYNTHETIC_BASE_PREMIUM: f64 = 350.0;
/// Lowest premium either chain will quote.
pub const PREMIUM_FLOOR: f64 = 0.05;

/// Listed expiries may move off the weekly Thursday around exchange holidays.
const EXPIRY_TOLERANCE_DAYS: i64 = 3;

type ContractKey = (OptionRight, i64, NaiveDate);

#[derive(Debug, Clone)]
struct ContractSeries {
    instrument: Instrument,
    premiums: BTreeMap<NaiveDateTime, f64>,
}

/// Option chain backed by recorded per-minute premiums.
#[derive(Debug, Clone, Default)]
pub struct HistoricalChain {
    contracts: HashMap<ContractKey, ContractSeries>,
}

impl HistoricalChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one premium observation.
    pub fn insert(&mut self, instrument: Instrument, at: NaiveDateTime, premium: f64) {
        let key = key_of(instrument.right, instrument.strike, instrument.expiry);
        self.contracts
            .entry(key)
            .or_insert_with(|| ContractSeries {
                instrument,
                premiums: BTreeMap::new(),
            })
            .premiums
            .insert(at, premium);
    }

    /// Number of distinct contracts.
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Total premium observations across contracts.
    pub fn observation_count(&self) -> usize {
        self.contracts.values().map(|c| c.premiums.len()).sum()
    }

    fn series(&self, instrument: &Instrument) -> Option<&ContractSeries> {
        self.contracts
            .get(&key_of(instrument.right, instrument.strike, instrument.expiry))
    }
}

impl OptionChain for HistoricalChain {
    /// Exact expiry first, otherwise the closest listed expiry within a few
    /// days for the same right and strike.
    fn resolve(&self, direction: Direction, strike: f64, expiry: NaiveDate) -> Option<Instrument> {
        let right = direction.right();
        if let Some(series) = self.contracts.get(&key_of(right, strike, expiry)) {
            return Some(series.instrument.clone());
        }
        let strike_key = strike.round() as i64;
        self.contracts
            .iter()
            .filter(|((r, s, _), _)| *r == right && *s == strike_key)
            .map(|((_, _, listed), series)| ((*listed - expiry).num_days().abs(), series))
            .filter(|(distance, _)| *distance <= EXPIRY_TOLERANCE_DAYS)
            .min_by_key(|(distance, series)| (*distance, series.instrument.expiry))
            .map(|(_, series)| series.instrument.clone())
    }

    fn premium_at(&self, instrument: &Instrument, at: NaiveDateTime) -> Option<f64> {
        self.series(instrument)?.premiums.get(&at).copied()
    }
}

fn key_of(right: OptionRight, strike: f64, expiry: NaiveDate) -> ContractKey {
    (right, strike.round() as i64, expiry)
}

/// Fixed-delta premium model.
///
/// Every contract quotes `350 ± 0.65 × (spot − day open)`, rising with the
/// underlying for CE and falling for PE, floored at 0.05. The strike does
/// not enter the price.
#[derive(Debug, Clone, Default)]
pub struct SyntheticChain {
    underlying: String,
    spot: BTreeMap<NaiveDateTime, f64>,
    day_open: BTreeMap<NaiveDate, f64>,
}

impl SyntheticChain {
    pub fn from_candles<'c>(underlying: &str, candles: impl IntoIterator<Item = &'c Candle>) -> Self {
        let mut chain = Self {
            underlying: underlying.to_string(),
            ..Self::default()
        };
        for candle in candles {
            chain.spot.insert(candle.timestamp, candle.close);
            chain.day_open.entry(candle.date()).or_insert(candle.open);
        }
        chain
    }
}

impl OptionChain for SyntheticChain {
    fn resolve(&self, direction: Direction, strike: f64, expiry: NaiveDate) -> Option<Instrument> {
        (strike > 0.0).then(|| Instrument::new(self.underlying.clone(), direction.right(), strike, expiry))
    }

    fn premium_at(&self, instrument: &Instrument, at: NaiveDateTime) -> Option<f64> {
        let spot = *self.spot.get(&at)?;
        let open = *self.day_open.get(&at.date())?;
        let change = SYNTHETIC_DELTA * (spot - open);
        let premium = match instrument.right {
            OptionRight::Ce => SYNTHETIC_BASE_PREMIUM + change,
            OptionRight::Pe => SYNTHETIC_BASE_PREMIUM - change,
        };
        Some(premium.max(PREMIUM_FLOOR))
    }
}
