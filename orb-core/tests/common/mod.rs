//! Shared fixtures for orb-core integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use orb_core::domain::{Candle, Direction, Instrument};
use orb_core::strategy::OptionChain;

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
}

pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    day().and_hms_opt(hour, minute, 0).unwrap()
}

pub fn candle(ts: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle::new(ts, open, high, low, close)
}

/// Quiet candles every minute from `from` up to and including `to`,
/// oscillating inside [low, high].
pub fn filler(from: NaiveDateTime, to: NaiveDateTime, low: f64, high: f64) -> Vec<Candle> {
    let mid = (low + high) / 2.0;
    let mut out = Vec::new();
    let mut ts = from;
    let mut i = 0;
    while ts <= to {
        let close = if i % 2 == 0 { mid + 1.0 } else { mid - 1.0 };
        out.push(Candle::new(ts, mid, high, low, close));
        ts += Duration::minutes(1);
        i += 1;
    }
    out
}

/// Chain listing every positive strike; every instrument shares one
/// premium curve and the prevailing quote is the latest at or before `at`.
#[derive(Debug, Clone, Default)]
pub struct CurveChain {
    pub curve: BTreeMap<NaiveDateTime, f64>,
}

impl CurveChain {
    pub fn new(points: &[(NaiveDateTime, f64)]) -> Self {
        Self {
            curve: points.iter().copied().collect(),
        }
    }
}

impl OptionChain for CurveChain {
    fn resolve(&self, direction: Direction, strike: f64, expiry: NaiveDate) -> Option<Instrument> {
        (strike > 0.0).then(|| Instrument::new("NIFTY", direction.right(), strike, expiry))
    }

    fn premium_at(&self, _instrument: &Instrument, at: NaiveDateTime) -> Option<f64> {
        self.curve.range(..=at).next_back().map(|(_, p)| *p)
    }
}

/// Premium follows the underlying with a fixed delta around a base value.
#[derive(Debug, Clone, Default)]
pub struct DeltaChain {
    pub spot: BTreeMap<NaiveDateTime, f64>,
}

impl DeltaChain {
    pub fn from_candles(candles: &[Candle]) -> Self {
        Self {
            spot: candles.iter().map(|c| (c.timestamp, c.close)).collect(),
        }
    }
}

impl OptionChain for DeltaChain {
    fn resolve(&self, direction: Direction, strike: f64, expiry: NaiveDate) -> Option<Instrument> {
        (strike > 0.0).then(|| Instrument::new("NIFTY", direction.right(), strike, expiry))
    }

    fn premium_at(&self, instrument: &Instrument, at: NaiveDateTime) -> Option<f64> {
        let spot = *self.spot.get(&at)?;
        let moneyness = match instrument.right {
            orb_core::domain::OptionRight::Ce => spot - instrument.strike,
            orb_core::domain::OptionRight::Pe => instrument.strike - spot,
        };
        Some((150.0 + 0.65 * moneyness).max(0.05))
    }
}
