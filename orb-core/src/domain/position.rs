//! Position — the mutable core entity of the lifecycle state machine.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::PositionId;
use super::instrument::{Direction, Instrument};
use super::levels::BreakoutEvent;

/// Exit regime of an open position.
///
/// A → B happens at most once and never reverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    /// Structural stop on the underlying (L1 for CALL, H1 for PUT).
    A,
    /// Premium trailing ladder.
    B,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::A => write!(f, "A"),
            Regime::B => write!(f, "B"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    PendingEntry,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// Regime A: underlying breached the structural stop.
    CandleSl,
    /// Regime B: premium fell to the trailing stop.
    PremiumTrailSl,
    /// Premium gain reached T5.
    PremiumTarget,
    /// Closed at the day's force-exit time.
    ForceExit,
}

impl ExitReason {
    /// Only stop-loss exits earn a fresh entry watch for the same direction.
    pub fn allows_reentry(self) -> bool {
        matches!(self, ExitReason::CandleSl | ExitReason::PremiumTrailSl)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::CandleSl => "CANDLE_SL",
            ExitReason::PremiumTrailSl => "PREMIUM_TRAIL_SL",
            ExitReason::PremiumTarget => "PREMIUM_TARGET",
            ExitReason::ForceExit => "FORCE_EXIT",
        };
        write!(f, "{s}")
    }
}

/// Active stop of a position; its unit depends on the regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "level", rename_all = "snake_case")]
pub enum StopLevel {
    /// Underlying index level (Regime A).
    Underlying(f64),
    /// Option premium level (Regime B).
    Premium(f64),
}

impl StopLevel {
    pub fn value(&self) -> f64 {
        match self {
            StopLevel::Underlying(v) | StopLevel::Premium(v) => *v,
        }
    }
}

/// A single option position from selection to close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub instrument: Instrument,
    pub direction: Direction,
    pub breakout: BreakoutEvent,

    // ── Entry ──
    pub entry_price: f64,
    pub entry_time: Option<NaiveDateTime>,
    /// Underlying level crossed at entry (H1 for CALL, L1 for PUT, or a gap open beyond it).
    pub entry_underlying_level: f64,

    // ── Stop management ──
    pub regime: Regime,
    pub current_sl: StopLevel,
    /// Trailing triggers consumed (0..=5; 5 means the full target exit).
    pub ladder_stage: u8,
    /// Highest premium gain seen while open.
    pub peak_gain: f64,
    pub last_premium: Option<f64>,

    // ── Lifecycle ──
    pub status: PositionStatus,
    pub exit_reason: Option<ExitReason>,
    pub exit_price: Option<f64>,
    pub exit_time: Option<NaiveDateTime>,
    pub exit_underlying: Option<f64>,
}

impl Position {
    /// A position awaiting its entry fill.
    pub fn pending(
        id: PositionId,
        instrument: Instrument,
        breakout: BreakoutEvent,
        entry_underlying_level: f64,
    ) -> Self {
        Self {
            id,
            instrument,
            direction: breakout.direction,
            current_sl: StopLevel::Underlying(breakout.stop_level()),
            breakout,
            entry_price: 0.0,
            entry_time: None,
            entry_underlying_level,
            regime: Regime::A,
            ladder_stage: 0,
            peak_gain: 0.0,
            last_premium: None,
            status: PositionStatus::PendingEntry,
            exit_reason: None,
            exit_price: None,
            exit_time: None,
            exit_underlying: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status == PositionStatus::Closed
    }

    /// Premium gain in points relative to the entry price.
    pub fn gain(&self, premium: f64) -> f64 {
        premium - self.entry_price
    }

    /// 0-based re-entry number (0 = first entry of the day in this direction).
    pub fn reentry_number(&self) -> u32 {
        self.id.entry_number.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OpeningRange, OptionRight};
    use chrono::NaiveDate;

    fn sample_position() -> Position {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let breakout = BreakoutEvent {
            direction: Direction::Call,
            h1: 21_760.0,
            l1: 21_690.0,
            breakout_candle_index: 4,
            confirmed_at: day.and_hms_opt(9, 19, 0).unwrap(),
            range: OpeningRange {
                h3: 21_740.0,
                l3: 21_680.0,
                candle_count: 3,
            },
        };
        let inst = Instrument::new("NIFTY", OptionRight::Ce, 21_500.0, day);
        Position::pending(PositionId::new(day, Direction::Call, 1), inst, breakout, 21_760.0)
    }

    #[test]
    fn pending_position_starts_in_regime_a_with_structural_stop() {
        let pos = sample_position();
        assert_eq!(pos.status, PositionStatus::PendingEntry);
        assert_eq!(pos.regime, Regime::A);
        assert_eq!(pos.current_sl, StopLevel::Underlying(21_690.0));
        assert_eq!(pos.ladder_stage, 0);
        assert_eq!(pos.reentry_number(), 0);
    }

    #[test]
    fn gain_is_relative_to_entry() {
        let mut pos = sample_position();
        pos.entry_price = 250.0;
        assert_eq!(pos.gain(280.0), 30.0);
        assert_eq!(pos.gain(240.0), -10.0);
    }

    #[test]
    fn only_stop_exits_allow_reentry() {
        assert!(ExitReason::CandleSl.allows_reentry());
        assert!(ExitReason::PremiumTrailSl.allows_reentry());
        assert!(!ExitReason::PremiumTarget.allows_reentry());
        assert!(!ExitReason::ForceExit.allows_reentry());
    }

    #[test]
    fn exit_reason_display_matches_ledger_names() {
        assert_eq!(ExitReason::PremiumTrailSl.to_string(), "PREMIUM_TRAIL_SL");
        assert_eq!(
            serde_json::to_string(&ExitReason::CandleSl).unwrap(),
            "\"CANDLE_SL\""
        );
    }

    #[test]
    fn stop_level_serialization_roundtrip() {
        let sl = StopLevel::Premium(280.0);
        let json = serde_json::to_string(&sl).unwrap();
        let back: StopLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(sl, back);
        assert_eq!(back.value(), 280.0);
    }
}
