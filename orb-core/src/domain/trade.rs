//! TradeRecord — an immutable, cost-adjusted record of a closed position.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::ids::PositionId;
use super::instrument::{Direction, Instrument};
use super::position::{ExitReason, Position, PositionStatus, Regime, StopLevel};
use crate::error::OrbError;

/// Itemised transaction costs for one round trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeesBreakdown {
    pub brokerage: f64,
    pub stt: f64,
    pub exchange: f64,
    pub gst: f64,
    pub sebi: f64,
    pub stamp_duty: f64,
}

impl FeesBreakdown {
    pub fn total(&self) -> f64 {
        self.brokerage + self.stt + self.exchange + self.gst + self.sebi + self.stamp_duty
    }
}

/// A completed round trip: entry → exit, with P&L net of fees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Identification ──
    pub position_id: PositionId,
    pub trading_day: NaiveDate,
    pub direction: Direction,
    pub instrument: Instrument,
    pub reentry_number: u32,

    // ── Structure ──
    pub h3: f64,
    pub l3: f64,
    pub h1: f64,
    pub l1: f64,

    // ── Entry ──
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub entry_underlying_level: f64,

    // ── Exit ──
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_underlying: f64,
    pub exit_reason: ExitReason,
    pub regime_at_exit: Regime,
    pub ladder_stage: u8,
    pub final_sl: StopLevel,
    /// Highest premium gain over entry while the position was open.
    pub peak_gain: f64,

    // ── Size ──
    pub lots: u32,
    pub lot_size: u32,

    // ── PnL ──
    pub gross_pnl: f64,
    pub fees: FeesBreakdown,
    pub net_pnl: f64,
}

impl TradeRecord {
    /// Build the ledger record for a closed position.
    ///
    /// Fails with an invariant violation if the position is not fully closed.
    pub fn from_closed(
        position: &Position,
        lots: u32,
        lot_size: u32,
        fees: FeesBreakdown,
    ) -> Result<Self, OrbError> {
        let incomplete = || {
            OrbError::InvariantViolation(format!(
                "position {} cannot be recorded: status {:?} with incomplete exit",
                position.id, position.status
            ))
        };
        if position.status != PositionStatus::Closed {
            return Err(incomplete());
        }
        let entry_time = position.entry_time.ok_or_else(incomplete)?;
        let exit_time = position.exit_time.ok_or_else(incomplete)?;
        let exit_price = position.exit_price.ok_or_else(incomplete)?;
        let exit_reason = position.exit_reason.ok_or_else(incomplete)?;
        let exit_underlying = position.exit_underlying.ok_or_else(incomplete)?;

        let quantity = f64::from(lots) * f64::from(lot_size);
        let gross_pnl = (exit_price - position.entry_price) * quantity;
        let net_pnl = gross_pnl - fees.total();

        Ok(Self {
            position_id: position.id.clone(),
            trading_day: position.id.date,
            direction: position.direction,
            instrument: position.instrument.clone(),
            reentry_number: position.reentry_number(),
            h3: position.breakout.range.h3,
            l3: position.breakout.range.l3,
            h1: position.breakout.h1,
            l1: position.breakout.l1,
            entry_time,
            entry_price: position.entry_price,
            entry_underlying_level: position.entry_underlying_level,
            exit_time,
            exit_price,
            exit_underlying,
            exit_reason,
            regime_at_exit: position.regime,
            ladder_stage: position.ladder_stage,
            final_sl: position.current_sl,
            peak_gain: position.peak_gain,
            lots,
            lot_size,
            gross_pnl,
            fees,
            net_pnl,
        })
    }

    pub fn quantity(&self) -> u32 {
        self.lots * self.lot_size
    }

    pub fn total_fees(&self) -> f64 {
        self.fees.total()
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    /// Minutes the position was held.
    pub fn minutes_held(&self) -> i64 {
        (self.exit_time - self.entry_time).num_minutes()
    }
}
