//! Strategy configuration — one parameterised structure consumed by every component.
//!
//! The two published parameter sets ("original" and "tuned") are presets of the
//! same struct, never separate code paths. `validate()` is called once at startup;
//! components assume a validated config.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::costs::CostSchedule;
use crate::error::ConfigError;

/// Number of trailing steps in the premium ladder (T1..T5).
pub const LADDER_STEPS: usize = 5;

/// Complete configuration for one strategy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub session: SessionConfig,
    pub filter: FilterConfig,
    /// Premium gain triggers T1..T5 in points, strictly ascending.
    pub ladder: Ladder,
    pub instrument: InstrumentConfig,
    pub costs: CostSchedule,
    /// Re-entries allowed per direction per day after stop-loss exits.
    pub max_reentries: i32,
    /// Skip an entry when the candle's assumed path touches the stop before the entry level.
    pub sl_before_entry_guard: bool,
}

/// Session timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub market_open: NaiveTime,
    pub orb_candles: usize,
    /// No entries at or after this time.
    pub no_entry_after: NaiveTime,
    /// Every open position is closed at this time.
    pub force_exit_time: NaiveTime,
    /// Largest allowed spacing between consecutive candles.
    pub max_gap_minutes: i64,
}

/// Entry filter settings (RSI band and SuperTrend agreement).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub rsi_enabled: bool,
    pub rsi_period: usize,
    pub rsi_low: f64,
    pub rsi_high: f64,
    pub supertrend_enabled: bool,
    pub supertrend_period: usize,
    pub supertrend_multiplier: f64,
}

/// Option contract selection and sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    pub underlying: String,
    pub lot_size: u32,
    pub lots: u32,
    pub strike_step: f64,
    /// Points in-the-money: CE strike = ATM - offset, PE strike = ATM + offset.
    pub itm_offset: f64,
}

/// Premium trailing ladder triggers T1..T5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ladder(pub Vec<f64>);

impl Ladder {
    /// Ladder with `T1 = first` and a constant `step` between triggers.
    pub fn uniform(first: f64, step: f64) -> Self {
        Self((0..LADDER_STEPS).map(|i| first + step * i as f64).collect())
    }

    /// Gain trigger for stage `k` (1-based, 1..=5).
    pub fn trigger(&self, k: u8) -> f64 {
        self.0[usize::from(k) - 1]
    }

    /// Stop level, as gain over entry, once stage `k` (1..=4) is reached.
    ///
    /// Stage 1 trails to breakeven; stage k trails to T(k-1).
    pub fn trail_to(&self, k: u8) -> f64 {
        if k <= 1 {
            0.0
        } else {
            self.trigger(k - 1)
        }
    }

    /// Gain at which the position is fully closed (T5).
    pub fn target(&self) -> f64 {
        self.trigger(LADDER_STEPS as u8)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.0.len() != LADDER_STEPS {
            return Err(ConfigError::LadderLength(self.0.len()));
        }
        let mut prev = 0.0;
        for (i, &value) in self.0.iter().enumerate() {
            if !value.is_finite() || value <= prev {
                return Err(ConfigError::LadderNotAscending { index: i + 1, value });
            }
            prev = value;
        }
        Ok(())
    }
}

impl Default for Ladder {
    fn default() -> Self {
        Self::uniform(30.0, 30.0)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            market_open: hm(9, 15),
            orb_candles: 3,
            no_entry_after: hm(11, 30),
            force_exit_time: hm(15, 15),
            max_gap_minutes: 1,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            rsi_enabled: true,
            rsi_period: 14,
            rsi_low: 40.0,
            rsi_high: 65.0,
            supertrend_enabled: true,
            supertrend_period: 10,
            supertrend_multiplier: 3.0,
        }
    }
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            underlying: "NIFTY".into(),
            lot_size: 25,
            lots: 1,
            strike_step: 100.0,
            itm_offset: 200.0,
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::original()
    }
}

impl StrategyConfig {
    /// Original parameter set: 3-candle range, RSI 40–65, SuperTrend 10/3,
    /// up to 4 re-entries, ladder 30/60/90/120/150, entries until 11:30.
    pub fn original() -> Self {
        Self {
            session: SessionConfig::default(),
            filter: FilterConfig::default(),
            ladder: Ladder::uniform(30.0, 30.0),
            instrument: InstrumentConfig::default(),
            costs: CostSchedule::default(),
            max_reentries: 4,
            sl_before_entry_guard: true,
        }
    }

    /// Tuned parameter set: 10-candle range, RSI off, SuperTrend 14/3,
    /// 1 re-entry, ladder 40/80/120/160/200, entries until 12:00.
    pub fn tuned() -> Self {
        Self {
            session: SessionConfig {
                orb_candles: 10,
                no_entry_after: hm(12, 0),
                ..SessionConfig::default()
            },
            filter: FilterConfig {
                rsi_enabled: false,
                rsi_low: 0.0,
                rsi_high: 100.0,
                supertrend_period: 14,
                ..FilterConfig::default()
            },
            ladder: Ladder::uniform(40.0, 40.0),
            max_reentries: 1,
            ..Self::original()
        }
    }

    /// Check every parameter; the first violation is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.session;
        if s.orb_candles < 1 {
            return Err(ConfigError::OrbCandles(s.orb_candles));
        }
        if s.force_exit_time <= s.market_open {
            return Err(ConfigError::ForceExitBeforeOpen {
                force_exit_time: s.force_exit_time,
                market_open: s.market_open,
            });
        }
        if s.no_entry_after > s.force_exit_time {
            return Err(ConfigError::EntryCutoffAfterForceExit {
                no_entry_after: s.no_entry_after,
                force_exit_time: s.force_exit_time,
            });
        }
        if s.max_gap_minutes < 1 {
            return Err(ConfigError::NonPositive {
                field: "max_gap_minutes",
                value: s.max_gap_minutes as f64,
            });
        }

        self.ladder.validate()?;

        if self.max_reentries < 0 {
            return Err(ConfigError::NegativeReentries(self.max_reentries));
        }

        let f = &self.filter;
        if !(0.0..=100.0).contains(&f.rsi_low)
            || !(0.0..=100.0).contains(&f.rsi_high)
            || f.rsi_low > f.rsi_high
        {
            return Err(ConfigError::RsiBand {
                low: f.rsi_low,
                high: f.rsi_high,
            });
        }
        if f.rsi_period < 1 {
            return Err(ConfigError::IndicatorPeriod { name: "rsi" });
        }
        if f.supertrend_period < 1 {
            return Err(ConfigError::IndicatorPeriod { name: "supertrend" });
        }
        if !(f.supertrend_multiplier > 0.0) {
            return Err(ConfigError::SupertrendMultiplier(f.supertrend_multiplier));
        }

        let i = &self.instrument;
        if i.lot_size == 0 {
            return Err(ConfigError::NonPositive { field: "lot_size", value: 0.0 });
        }
        if i.lots == 0 {
            return Err(ConfigError::NonPositive { field: "lots", value: 0.0 });
        }
        if !(i.strike_step > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "strike_step",
                value: i.strike_step,
            });
        }
        if !(i.itm_offset >= 0.0) {
            return Err(ConfigError::Negative {
                field: "itm_offset",
                value: i.itm_offset,
            });
        }

        self.costs.validate()
    }

    /// Entries allowed per direction per day: the initial entry plus re-entries.
    pub fn max_entries_per_direction(&self) -> u32 {
        self.max_reentries.max(0) as u32 + 1
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}
