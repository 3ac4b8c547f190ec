//! Position Lifecycle State Machine.
//!
//! `PENDING_ENTRY → OPEN → CLOSED`. While open, a position is in Regime A
//! (structural stop on the underlying) until its premium gain reaches T1,
//! then in Regime B (premium trailing ladder) for the rest of its life.
//! Candles and premium ticks must arrive in timestamp order; a closed
//! position accepts no further events.

use chrono::NaiveDateTime;
use tracing::{debug, error, info};

use super::ratchet::RatchetState;
use crate::config::{Ladder, LADDER_STEPS};
use crate::domain::{Candle, ExitReason, Instrument, Position, PositionId, PositionStatus, Regime, StopLevel};
use crate::error::{DataGapError, OrbError};
use crate::strategy::structural_breach;

/// Owns one position from fill to close.
#[derive(Debug, Clone)]
pub struct PositionMachine {
    position: Position,
    ladder: Ladder,
    ratchet: RatchetState,
    last_tick_at: NaiveDateTime,
    last_underlying: f64,
}

impl PositionMachine {
    /// Fill a pending position at `premium` and open it in Regime A.
    pub fn open(
        mut pending: Position,
        ladder: &Ladder,
        premium: f64,
        at: NaiveDateTime,
    ) -> Result<Self, OrbError> {
        if pending.status != PositionStatus::PendingEntry {
            return Err(OrbError::unexpected_event(&pending.id, pending.status, "entry fill"));
        }
        validate_premium(&pending.instrument, at, premium)?;

        pending.status = PositionStatus::Open;
        pending.entry_price = premium;
        pending.entry_time = Some(at);
        pending.last_premium = Some(premium);

        info!(
            id = %pending.id,
            instrument = %pending.instrument,
            premium,
            underlying = pending.entry_underlying_level,
            stop = pending.current_sl.value(),
            "position opened"
        );

        Ok(Self {
            last_underlying: pending.entry_underlying_level,
            position: pending,
            ladder: ladder.clone(),
            ratchet: RatchetState::new(),
            last_tick_at: at,
        })
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn into_position(self) -> Position {
        self.position
    }

    pub fn id(&self) -> &PositionId {
        &self.position.id
    }

    pub fn instrument(&self) -> &Instrument {
        &self.position.instrument
    }

    pub fn is_open(&self) -> bool {
        self.position.is_open()
    }

    pub fn regime(&self) -> Regime {
        self.position.regime
    }

    pub fn current_sl(&self) -> StopLevel {
        self.position.current_sl
    }

    pub fn ladder_stage(&self) -> u8 {
        self.position.ladder_stage
    }

    /// Floor of the premium trailing stop; `None` until Regime B.
    pub fn trail_floor(&self) -> Option<f64> {
        self.ratchet.current_level()
    }

    /// Underlying candle close. Only Regime A reacts: a breach of the
    /// structural stop closes with `CANDLE_SL` at the quoted premium, or at
    /// the last known premium when the chain has no quote for this minute.
    pub fn on_candle(
        &mut self,
        candle: &Candle,
        premium: Option<f64>,
    ) -> Result<Option<ExitReason>, OrbError> {
        self.ensure_open("candle")?;
        self.last_underlying = candle.close;

        if self.position.regime != Regime::A {
            return Ok(None);
        }
        let Some(level) = structural_breach(&self.position.breakout, candle) else {
            return Ok(None);
        };
        let price = self.exit_premium(candle.timestamp, premium)?;
        self.close(ExitReason::CandleSl, price, candle.timestamp, level);
        Ok(Some(ExitReason::CandleSl))
    }

    /// Premium tick for this position's instrument.
    pub fn on_premium(
        &mut self,
        at: NaiveDateTime,
        premium: f64,
    ) -> Result<Option<ExitReason>, OrbError> {
        self.ensure_open("premium tick")?;
        validate_premium(&self.position.instrument, at, premium)?;
        if at < self.last_tick_at {
            return Err(DataGapError::StaleTick {
                symbol: self.position.instrument.symbol(),
                previous: self.last_tick_at,
                got: at,
            }
            .into());
        }
        self.last_tick_at = at;
        self.position.last_premium = Some(premium);

        let entry = self.position.entry_price;
        let gain = self.position.gain(premium);
        self.position.peak_gain = self.position.peak_gain.max(gain);

        match self.position.regime {
            Regime::A => {
                if gain < self.ladder.trigger(1) {
                    return Ok(None);
                }
                self.position.regime = Regime::B;
                self.ratchet = RatchetState::with_initial_level(entry);
                info!(id = %self.position.id, premium, gain, "regime B: trailing ladder armed");
            }
            Regime::B => {
                let stop = self.current_sl().value();
                if premium <= stop {
                    self.close(ExitReason::PremiumTrailSl, stop, at, self.last_underlying);
                    return Ok(Some(ExitReason::PremiumTrailSl));
                }
            }
        }

        while usize::from(self.position.ladder_stage) < LADDER_STEPS {
            let k = self.position.ladder_stage + 1;
            if gain < self.ladder.trigger(k) {
                break;
            }
            self.position.ladder_stage = k;
            if usize::from(k) == LADDER_STEPS {
                let target = entry + self.ladder.target();
                self.close(ExitReason::PremiumTarget, target, at, self.last_underlying);
                return Ok(Some(ExitReason::PremiumTarget));
            }
            let level = self.ratchet.apply(entry + self.ladder.trail_to(k));
            self.position.current_sl = StopLevel::Premium(level);
            debug!(id = %self.position.id, stage = k, stop = level, "ladder ratchet");
        }
        Ok(None)
    }

    /// Close at the force-exit time at the prevailing premium, regardless of
    /// regime or ladder stage.
    pub fn force_exit(
        &mut self,
        at: NaiveDateTime,
        premium: Option<f64>,
    ) -> Result<ExitReason, OrbError> {
        self.ensure_open("force exit")?;
        let price = self.exit_premium(at, premium)?;
        self.close(ExitReason::ForceExit, price, at, self.last_underlying);
        Ok(ExitReason::ForceExit)
    }

    fn ensure_open(&self, event: &str) -> Result<(), OrbError> {
        if self.position.status == PositionStatus::Open {
            return Ok(());
        }
        let err = OrbError::unexpected_event(&self.position.id, self.position.status, event);
        error!(id = %self.position.id, event, "{err}");
        Err(err)
    }

    fn exit_premium(&self, at: NaiveDateTime, quoted: Option<f64>) -> Result<f64, OrbError> {
        match quoted {
            Some(premium) => {
                validate_premium(&self.position.instrument, at, premium)?;
                Ok(premium)
            }
            None => self.position.last_premium.ok_or_else(|| {
                DataGapError::MissingPremium {
                    symbol: self.position.instrument.symbol(),
                    at,
                }
                .into()
            }),
        }
    }

    fn close(&mut self, reason: ExitReason, price: f64, at: NaiveDateTime, underlying: f64) {
        let pos = &mut self.position;
        pos.status = PositionStatus::Closed;
        pos.exit_reason = Some(reason);
        pos.exit_price = Some(price);
        pos.exit_time = Some(at);
        pos.exit_underlying = Some(underlying);
        info!(
            id = %pos.id,
            reason = %reason,
            entry = pos.entry_price,
            exit = price,
            regime = %pos.regime,
            stage = pos.ladder_stage,
            "position closed"
        );
    }
}

fn validate_premium(instrument: &Instrument, at: NaiveDateTime, premium: f64) -> Result<(), OrbError> {
    if premium.is_finite() && premium >= 0.0 {
        return Ok(());
    }
    Err(DataGapError::MalformedPremium {
        symbol: instrument.symbol(),
        at,
        premium,
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BreakoutEvent, Direction, OpeningRange, OptionRight};
    use chrono::{Duration, NaiveDate};

    fn t(minute: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 20, 0)
            .unwrap()
            + Duration::minutes(minute)
    }

    fn pending(direction: Direction) -> Position {
        let day = t(0).date();
        let breakout = BreakoutEvent {
            direction,
            h1: 21_760.0,
            l1: 21_690.0,
            breakout_candle_index: 4,
            confirmed_at: t(0),
            range: OpeningRange {
                h3: 21_740.0,
                l3: 21_700.0,
                candle_count: 3,
            },
        };
        let right = direction.right();
        let strike = if right == OptionRight::Ce { 21_500.0 } else { 22_000.0 };
        let inst = Instrument::new("NIFTY", right, strike, day);
        Position::pending(PositionId::new(day, direction, 1), inst, breakout, breakout.entry_level())
    }

    fn open_call(premium: f64) -> PositionMachine {
        PositionMachine::open(pending(Direction::Call), &Ladder::default(), premium, t(1)).unwrap()
    }

    fn candle(minute: i64, low: f64, high: f64) -> Candle {
        Candle::new(t(minute), (low + high) / 2.0, high, low, (low + high) / 2.0)
    }

    #[test]
    fn structural_stop_closes_in_regime_a() {
        let mut m = open_call(300.0);
        assert_eq!(m.on_candle(&candle(2, 21_700.0, 21_770.0), Some(305.0)).unwrap(), None);
        let reason = m.on_candle(&candle(3, 21_680.0, 21_720.0), Some(270.0)).unwrap();
        assert_eq!(reason, Some(ExitReason::CandleSl));
        let pos = m.position();
        assert_eq!(pos.exit_price, Some(270.0));
        assert_eq!(pos.exit_underlying, Some(21_690.0));
        assert_eq!(pos.regime, Regime::A);
    }

    #[test]
    fn candle_stop_uses_last_premium_when_unquoted() {
        let mut m = open_call(300.0);
        m.on_premium(t(2), 290.0).unwrap();
        m.on_candle(&candle(3, 21_600.0, 21_700.0), None).unwrap();
        assert_eq!(m.position().exit_price, Some(290.0));
    }

    #[test]
    fn t1_moves_to_breakeven() {
        let mut m = open_call(50.0);
        assert_eq!(m.on_premium(t(2), 79.0).unwrap(), None);
        assert_eq!(m.regime(), Regime::A);
        assert_eq!(m.on_premium(t(3), 80.0).unwrap(), None);
        assert_eq!(m.regime(), Regime::B);
        assert_eq!(m.current_sl(), StopLevel::Premium(50.0));
        assert_eq!(m.ladder_stage(), 1);
    }

    #[test]
    fn ratchet_arms_at_entry_on_regime_b() {
        let mut m = open_call(50.0);
        m.on_premium(t(2), 70.0).unwrap();
        assert_eq!(m.trail_floor(), None);
        m.on_premium(t(3), 140.0).unwrap();
        assert_eq!(m.ladder_stage(), 3);
        assert_eq!(m.trail_floor(), Some(110.0));
        m.on_premium(t(4), 120.0).unwrap();
        assert_eq!(m.trail_floor(), Some(110.0));
        assert_eq!(m.position().peak_gain, 90.0);
    }

    #[test]
    fn regime_b_ignores_structural_stop() {
        let mut m = open_call(50.0);
        m.on_premium(t(2), 85.0).unwrap();
        assert_eq!(m.on_candle(&candle(3, 21_000.0, 21_100.0), Some(60.0)).unwrap(), None);
        assert!(m.is_open());
    }

    #[test]
    fn trailing_stop_exits_at_locked_level() {
        let mut m = open_call(50.0);
        m.on_premium(t(2), 80.0).unwrap();
        let reason = m.on_premium(t(3), 45.0).unwrap();
        assert_eq!(reason, Some(ExitReason::PremiumTrailSl));
        assert_eq!(m.position().exit_price, Some(50.0));
    }

    #[test]
    fn gap_through_several_triggers_ratchets_to_highest() {
        let mut m = open_call(100.0);
        m.on_premium(t(2), 195.0).unwrap();
        assert_eq!(m.ladder_stage(), 3);
        assert_eq!(m.current_sl(), StopLevel::Premium(160.0));
        m.on_premium(t(3), 170.0).unwrap();
        assert_eq!(m.current_sl(), StopLevel::Premium(160.0));
        assert!(m.is_open());
    }

    #[test]
    fn target_closes_at_t5() {
        let mut m = open_call(100.0);
        let reason = m.on_premium(t(2), 400.0).unwrap();
        assert_eq!(reason, Some(ExitReason::PremiumTarget));
        assert_eq!(m.position().exit_price, Some(250.0));
        assert_eq!(m.ladder_stage(), 5);
    }

    #[test]
    fn force_exit_at_prevailing_premium() {
        let mut m = open_call(50.0);
        m.on_premium(t(2), 55.0).unwrap();
        assert_eq!(m.force_exit(t(3), Some(60.0)).unwrap(), ExitReason::ForceExit);
        assert_eq!(m.position().exit_price, Some(60.0));
    }

    #[test]
    fn closed_position_rejects_events() {
        let mut m = open_call(50.0);
        m.force_exit(t(2), Some(60.0)).unwrap();
        assert!(matches!(m.on_premium(t(3), 70.0), Err(OrbError::InvariantViolation(_))));
        assert!(matches!(
            m.on_candle(&candle(3, 21_700.0, 21_750.0), Some(70.0)),
            Err(OrbError::InvariantViolation(_))
        ));
        assert!(m.force_exit(t(3), Some(70.0)).is_err());
    }

    #[test]
    fn malformed_and_stale_ticks_are_data_gaps() {
        let mut m = open_call(50.0);
        assert!(matches!(
            m.on_premium(t(2), -1.0),
            Err(OrbError::DataGap(DataGapError::MalformedPremium { .. }))
        ));
        m.on_premium(t(3), 51.0).unwrap();
        assert!(matches!(
            m.on_premium(t(2), 52.0),
            Err(OrbError::DataGap(DataGapError::StaleTick { .. }))
        ));
        assert!(PositionMachine::open(pending(Direction::Put), &Ladder::default(), f64::NAN, t(1)).is_err());
    }

    #[test]
    fn put_structural_stop_is_h1() {
        let mut m = PositionMachine::open(pending(Direction::Put), &Ladder::default(), 200.0, t(1)).unwrap();
        assert_eq!(m.current_sl(), StopLevel::Underlying(21_760.0));
        let reason = m.on_candle(&candle(2, 21_700.0, 21_765.0), Some(180.0)).unwrap();
        assert_eq!(reason, Some(ExitReason::CandleSl));
    }
}
