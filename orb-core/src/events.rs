//! Event merge: underlying candles and per-instrument premium ticks into one
//! timestamp-ordered stream.
//!
//! Each source must already be in order: candles strictly increasing, ticks
//! non-decreasing. The first inversion is a `DataGapError`; nothing is
//! re-sorted.
//!
//! Tie rule: at equal timestamps the candle comes first, then premium ticks in
//! their original order. A session force-exits on the first event of either
//! kind at or after its force-exit time.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Instrument};
use crate::error::DataGapError;

/// One premium observation for an option contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumTick {
    pub instrument: Instrument,
    pub timestamp: NaiveDateTime,
    pub premium: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarketEvent {
    Candle(Candle),
    Premium(PremiumTick),
}

impl MarketEvent {
    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            MarketEvent::Candle(c) => c.timestamp,
            MarketEvent::Premium(t) => t.timestamp,
        }
    }
}

/// Two-way merge of ordered candle and tick sources.
pub fn merge_streams(
    candles: Vec<Candle>,
    ticks: Vec<PremiumTick>,
) -> Result<Vec<MarketEvent>, DataGapError> {
    if let Some(pair) = candles.windows(2).find(|p| p[1].timestamp <= p[0].timestamp) {
        return Err(DataGapError::OutOfOrder {
            previous: pair[0].timestamp,
            got: pair[1].timestamp,
        });
    }
    if let Some(pair) = ticks.windows(2).find(|p| p[1].timestamp < p[0].timestamp) {
        return Err(DataGapError::StaleTick {
            symbol: pair[1].instrument.symbol(),
            previous: pair[0].timestamp,
            got: pair[1].timestamp,
        });
    }

    let mut events = Vec::with_capacity(candles.len() + ticks.len());
    let mut candles = candles.into_iter().peekable();
    let mut ticks = ticks.into_iter().peekable();
    loop {
        let candle_first = match (candles.peek(), ticks.peek()) {
            (Some(c), Some(t)) => c.timestamp <= t.timestamp,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        if candle_first {
            events.extend(candles.next().map(MarketEvent::Candle));
        } else {
            events.extend(ticks.next().map(MarketEvent::Premium));
        }
    }
    Ok(events)
}
