//! Session Orchestrator — one trading day, one context object.
//!
//! A `TradingSession` owns every piece of day-scoped state: the opening
//! range, the breakout structures, the per-direction re-entry counters and
//! the active positions. It is created at the start of a day and dropped at
//! the end; nothing carries over.
//!
//! Per candle, in order:
//! 1. sequence checks (order, day, gaps, sanity)
//! 2. force exit at `force_exit_time`, which ends the day
//! 3. opening range accumulation
//! 4. Regime A structural stops of open positions
//! 5. breakout detection (the entry watch starts on the next candle)
//! 6. entry triggers, filter, contract selection (before `no_entry_after`)
//!
//! Premium ticks are routed to the open position trading that instrument.
//! The first event of either kind at or after `force_exit_time` force-closes
//! every open position and ends the day; a late or missing 15:15 candle does
//! not delay the exit past the first tick.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::config::StrategyConfig;
use crate::costs::compute_costs;
use crate::domain::{
    BreakoutEvent, Candle, Direction, ExitReason, Instrument, OpeningRange, Position, PositionId,
    TradeRecord,
};
use crate::error::{DataGapError, OrbError};
use crate::events::{MarketEvent, PremiumTick};
use crate::ledger::TradeLedger;
use crate::position_management::PositionMachine;
use crate::strategy::{
    check_entry, stop_touched_first, BreakoutDetector, EntryFilter, IndicatorSource, OptionChain,
    OpeningRangeTracker, OptionSelector,
};

/// Orders per round trip (entry + exit).
const LEGS_PER_TRADE: u32 = 2;

/// Per-direction state: breakout levels, re-entry counter, active position.
#[derive(Debug, Default)]
struct DirectionSlot {
    breakout: Option<BreakoutEvent>,
    /// Whether an entry-trigger watch is running.
    armed: bool,
    /// First candle (session index) on which the watch may trigger.
    watch_from: usize,
    /// Entries taken today in this direction.
    entries: u32,
    active: Option<PositionMachine>,
}

pub struct TradingSession<'a> {
    config: &'a StrategyConfig,
    day: NaiveDate,
    ledger: &'a dyn TradeLedger,
    tracker: OpeningRangeTracker,
    detector: BreakoutDetector,
    filter: EntryFilter,
    selector: OptionSelector,
    slots: [DirectionSlot; 2],
    last_candle: Option<Candle>,
    candle_index: usize,
    ended: bool,
    trades: Vec<TradeRecord>,
    abandoned: Vec<OrbError>,
}

impl<'a> TradingSession<'a> {
    pub fn new(
        config: &'a StrategyConfig,
        day: NaiveDate,
        ledger: &'a dyn TradeLedger,
    ) -> Result<Self, OrbError> {
        config.validate()?;
        Ok(Self {
            config,
            day,
            ledger,
            tracker: OpeningRangeTracker::new(config.session.orb_candles)?,
            detector: BreakoutDetector::new(),
            filter: EntryFilter::new(&config.filter),
            selector: OptionSelector::new(&config.instrument),
            slots: Default::default(),
            last_candle: None,
            candle_index: 0,
            ended: false,
            trades: Vec::new(),
            abandoned: Vec::new(),
        })
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn range(&self) -> Option<OpeningRange> {
        self.tracker.range()
    }

    pub fn breakout(&self, direction: Direction) -> Option<BreakoutEvent> {
        self.slots[direction.index()].breakout
    }

    /// Entries taken today in `direction` (initial entry + re-entries).
    pub fn entries(&self, direction: Direction) -> u32 {
        self.slots[direction.index()].entries
    }

    /// Whether the session has passed its force-exit time.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Trades closed so far today.
    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<TradeRecord> {
        self.trades
    }

    /// Entry attempts abandoned because no contract or premium was available.
    pub fn abandoned_entries(&self) -> &[OrbError] {
        &self.abandoned
    }

    /// Currently open positions, CALL first.
    pub fn open_positions(&self) -> impl Iterator<Item = &Position> {
        self.slots
            .iter()
            .filter_map(|slot| slot.active.as_ref().map(PositionMachine::position))
    }

    /// Instruments of the currently open positions, CALL first.
    pub fn open_instruments(&self) -> Vec<Instrument> {
        self.open_positions().map(|p| p.instrument.clone()).collect()
    }

    /// Process one underlying candle close.
    pub fn on_candle(
        &mut self,
        candle: &Candle,
        chain: &dyn OptionChain,
        indicators: &dyn IndicatorSource,
    ) -> Result<(), OrbError> {
        if self.ended {
            debug!(at = %candle.timestamp, "candle after session end ignored");
            return Ok(());
        }
        let time = candle.timestamp.time();
        if time < self.config.session.market_open {
            debug!(at = %candle.timestamp, "pre-open candle ignored");
            return Ok(());
        }
        self.check_sequence(candle)?;
        self.candle_index += 1;

        if time >= self.config.session.force_exit_time {
            self.force_exit_all(candle.timestamp, chain)?;
            self.ended = true;
            self.last_candle = Some(candle.clone());
            return Ok(());
        }

        let Some(range) = self.tracker.range() else {
            if let Some(range) = self.tracker.observe(candle) {
                info!(
                    day = %self.day,
                    h3 = range.h3,
                    l3 = range.l3,
                    candles = range.candle_count,
                    "opening range set"
                );
            }
            self.detector.remember(candle);
            self.last_candle = Some(candle.clone());
            return Ok(());
        };

        for direction in Direction::ALL {
            self.check_structural_stop(direction, candle, chain)?;
        }

        if let Some(event) = self.detector.observe(candle, &range) {
            let slot = &mut self.slots[event.direction.index()];
            slot.breakout = Some(event);
            slot.armed = true;
            slot.watch_from = self.candle_index + 1;
        }

        if time < self.config.session.no_entry_after {
            for direction in Direction::ALL {
                self.try_enter(direction, candle, chain, indicators)?;
            }
        }

        self.last_candle = Some(candle.clone());
        Ok(())
    }

    /// Route a premium tick to the open position on that instrument.
    pub fn on_premium(&mut self, tick: &PremiumTick) -> Result<(), OrbError> {
        if self.ended {
            return Ok(());
        }
        if tick.timestamp.time() >= self.config.session.force_exit_time {
            return self.force_exit_on_tick(tick);
        }
        for direction in Direction::ALL {
            let slot = &mut self.slots[direction.index()];
            let Some(machine) = slot.active.as_mut() else {
                continue;
            };
            if machine.instrument() != &tick.instrument {
                continue;
            }
            if let Some(reason) = machine.on_premium(tick.timestamp, tick.premium)? {
                self.settle(direction, reason)?;
            }
            return Ok(());
        }
        debug!(symbol = %tick.instrument.symbol(), at = %tick.timestamp, "tick without open position");
        Ok(())
    }

    /// Backtest step: the candle, then a premium tick from the chain for
    /// every position still open at that minute.
    pub fn step(
        &mut self,
        candle: &Candle,
        chain: &dyn OptionChain,
        indicators: &dyn IndicatorSource,
    ) -> Result<(), OrbError> {
        self.on_candle(candle, chain, indicators)?;
        for instrument in self.open_instruments() {
            if let Some(premium) = chain.premium_at(&instrument, candle.timestamp) {
                self.on_premium(&PremiumTick {
                    instrument,
                    timestamp: candle.timestamp,
                    premium,
                })?;
            }
        }
        Ok(())
    }

    /// Replay a full day of candles through `step`, then close the session.
    pub fn replay_candles(
        &mut self,
        candles: &[Candle],
        chain: &dyn OptionChain,
        indicators: &dyn IndicatorSource,
    ) -> Result<(), OrbError> {
        for candle in candles {
            self.step(candle, chain, indicators)?;
        }
        self.finish(chain)
    }

    /// Replay an already-merged event stream, then close the session.
    pub fn replay(
        &mut self,
        events: impl IntoIterator<Item = MarketEvent>,
        chain: &dyn OptionChain,
        indicators: &dyn IndicatorSource,
    ) -> Result<(), OrbError> {
        for event in events {
            match event {
                MarketEvent::Candle(candle) => self.on_candle(&candle, chain, indicators)?,
                MarketEvent::Premium(tick) => self.on_premium(&tick)?,
            }
        }
        self.finish(chain)
    }

    /// End of data. Positions still open (the feed stopped before the
    /// force-exit time) are force-closed at the last candle.
    pub fn finish(&mut self, chain: &dyn OptionChain) -> Result<(), OrbError> {
        if self.ended {
            return Ok(());
        }
        if let Some(last) = self.last_candle.as_ref().map(|c| c.timestamp) {
            if self.open_positions().next().is_some() {
                warn!(day = %self.day, at = %last, "data ended before force exit; closing open positions");
            }
            self.force_exit_all(last, chain)?;
        }
        self.ended = true;
        Ok(())
    }

    fn check_sequence(&self, candle: &Candle) -> Result<(), DataGapError> {
        if !candle.is_sane() {
            return Err(DataGapError::MalformedCandle(candle.timestamp));
        }
        if candle.date() != self.day {
            return Err(DataGapError::WrongDay {
                day: self.day,
                got: candle.timestamp,
            });
        }
        if let Some(prev) = &self.last_candle {
            if candle.timestamp <= prev.timestamp {
                return Err(DataGapError::OutOfOrder {
                    previous: prev.timestamp,
                    got: candle.timestamp,
                });
            }
            let minutes = (candle.timestamp - prev.timestamp).num_minutes();
            if minutes > self.config.session.max_gap_minutes {
                return Err(DataGapError::MissingCandles {
                    previous: prev.timestamp,
                    got: candle.timestamp,
                    minutes,
                });
            }
        }
        Ok(())
    }

    fn check_structural_stop(
        &mut self,
        direction: Direction,
        candle: &Candle,
        chain: &dyn OptionChain,
    ) -> Result<(), OrbError> {
        let Some(machine) = self.slots[direction.index()].active.as_mut() else {
            return Ok(());
        };
        let premium = chain.premium_at(machine.instrument(), candle.timestamp);
        if let Some(reason) = machine.on_candle(candle, premium)? {
            self.settle(direction, reason)?;
        }
        Ok(())
    }

    fn try_enter(
        &mut self,
        direction: Direction,
        candle: &Candle,
        chain: &dyn OptionChain,
        indicators: &dyn IndicatorSource,
    ) -> Result<(), OrbError> {
        let slot = &self.slots[direction.index()];
        if !slot.armed || slot.active.is_some() || self.candle_index < slot.watch_from {
            return Ok(());
        }
        let Some(breakout) = slot.breakout else {
            return Ok(());
        };
        let entry_number = slot.entries + 1;
        if entry_number > self.config.max_entries_per_direction() {
            return Ok(());
        }
        let at = candle.timestamp;

        if self.config.sl_before_entry_guard && stop_touched_first(&breakout, candle) {
            debug!(direction = %direction, at = %at, "stop touched before entry level");
            return Ok(());
        }
        let Some(spot) = check_entry(direction, candle, breakout.h1, breakout.l1) else {
            return Ok(());
        };

        let rsi = indicators.rsi(at);
        let trend = indicators.supertrend(at);
        if !self.filter.allow(direction, rsi, trend) {
            debug!(direction = %direction, at = %at, ?rsi, ?trend, "entry filtered");
            return Ok(());
        }

        let instrument = match self.selector.select(direction, spot, self.day, chain) {
            Ok(instrument) => instrument,
            Err(err) => {
                warn!(direction = %direction, at = %at, %err, "entry abandoned");
                self.abandoned.push(err.into());
                return Ok(());
            }
        };
        let Some(premium) = chain.premium_at(&instrument, at) else {
            let err = DataGapError::MissingPremium {
                symbol: instrument.symbol(),
                at,
            };
            warn!(direction = %direction, %err, "entry abandoned");
            self.abandoned.push(err.into());
            return Ok(());
        };

        let id = PositionId::new(self.day, direction, entry_number);
        let pending = Position::pending(id, instrument, breakout, spot);
        let machine = PositionMachine::open(pending, &self.config.ladder, premium, at)?;

        let slot = &mut self.slots[direction.index()];
        slot.entries = entry_number;
        slot.active = Some(machine);
        Ok(())
    }

    /// Force exit driven by a premium tick: the ticked instrument closes at
    /// the tick, any other open position at its last known premium.
    fn force_exit_on_tick(&mut self, tick: &PremiumTick) -> Result<(), OrbError> {
        for direction in Direction::ALL {
            let Some(machine) = self.slots[direction.index()].active.as_mut() else {
                continue;
            };
            let quoted = (machine.instrument() == &tick.instrument).then_some(tick.premium);
            let reason = machine.force_exit(tick.timestamp, quoted)?;
            self.settle(direction, reason)?;
        }
        info!(day = %self.day, at = %tick.timestamp, "force exit on premium tick; session ended");
        self.ended = true;
        Ok(())
    }

    fn force_exit_all(&mut self, at: NaiveDateTime, chain: &dyn OptionChain) -> Result<(), OrbError> {
        for direction in Direction::ALL {
            let Some(machine) = self.slots[direction.index()].active.as_mut() else {
                continue;
            };
            let premium = chain.premium_at(machine.instrument(), at);
            let reason = machine.force_exit(at, premium)?;
            self.settle(direction, reason)?;
        }
        Ok(())
    }

    /// Record a just-closed position and decide whether to re-arm.
    fn settle(&mut self, direction: Direction, reason: ExitReason) -> Result<(), OrbError> {
        let slot = &mut self.slots[direction.index()];
        let Some(machine) = slot.active.take() else {
            return Err(OrbError::InvariantViolation(format!(
                "{direction} slot settled without an active position"
            )));
        };
        let position = machine.into_position();
        let (Some(exit_price), Some(exit_time)) = (position.exit_price, position.exit_time) else {
            return Err(OrbError::InvariantViolation(format!(
                "position {} settled before it closed",
                position.id
            )));
        };

        let sizing = &self.config.instrument;
        let fees = compute_costs(
            &self.config.costs,
            position.entry_price,
            exit_price,
            sizing.lots * sizing.lot_size,
            LEGS_PER_TRADE,
        );
        let record = TradeRecord::from_closed(&position, sizing.lots, sizing.lot_size, fees)?;
        info!(
            id = %record.position_id,
            reason = %reason,
            gross = record.gross_pnl,
            fees = record.total_fees(),
            net = record.net_pnl,
            "trade recorded"
        );
        self.ledger.append(record.clone());
        self.trades.push(record);

        let rearm = reason.allows_reentry()
            && exit_time.time() < self.config.session.no_entry_after
            && slot.entries < self.config.max_entries_per_direction();
        slot.armed = rearm;
        if rearm {
            slot.watch_from = self.candle_index + 1;
            info!(direction = %direction, entries = slot.entries, "re-entry watch armed");
        }
        Ok(())
    }
}
