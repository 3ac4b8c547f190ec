//! Shared fixtures for runner unit tests.

use chrono::NaiveDate;

use orb_core::domain::{
    BreakoutEvent, Direction, ExitReason, FeesBreakdown, Instrument, OpeningRange, PositionId,
    Regime, StopLevel, TradeRecord,
};

/// A closed CALL trade with no fees whose net P&L is `net`.
pub(crate) fn sample_trade(day: NaiveDate, net: f64) -> TradeRecord {
    let breakout = BreakoutEvent {
        direction: Direction::Call,
        h1: 22_060.0,
        l1: 21_990.0,
        breakout_candle_index: 4,
        confirmed_at: day.and_hms_opt(9, 18, 0).unwrap(),
        range: OpeningRange {
            h3: 22_050.0,
            l3: 21_980.0,
            candle_count: 3,
        },
    };
    let entry_price = 300.0;
    TradeRecord {
        position_id: PositionId::new(day, Direction::Call, 1),
        trading_day: day,
        direction: Direction::Call,
        instrument: Instrument::new("NIFTY", Direction::Call.right(), 21_900.0, day),
        reentry_number: 0,
        h3: breakout.range.h3,
        l3: breakout.range.l3,
        h1: breakout.h1,
        l1: breakout.l1,
        entry_time: day.and_hms_opt(9, 19, 0).unwrap(),
        entry_price,
        entry_underlying_level: breakout.h1,
        exit_time: day.and_hms_opt(10, 2, 0).unwrap(),
        exit_price: entry_price + net / 25.0,
        exit_underlying: 22_100.0,
        exit_reason: if net > 0.0 {
            ExitReason::PremiumTrailSl
        } else {
            ExitReason::CandleSl
        },
        regime_at_exit: if net > 0.0 { Regime::B } else { Regime::A },
        ladder_stage: if net > 0.0 { 1 } else { 0 },
        final_sl: if net > 0.0 {
            StopLevel::Premium(entry_price)
        } else {
            StopLevel::Underlying(breakout.l1)
        },
        peak_gain: net.max(0.0) / 25.0,
        lots: 1,
        lot_size: 25,
        gross_pnl: net,
        fees: FeesBreakdown::default(),
        net_pnl: net,
    }
}
