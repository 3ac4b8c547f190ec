//! Domain types for the ORB options engine

pub mod candle;
pub mod ids;
pub mod instrument;
pub mod levels;
pub mod position;
pub mod trade;

pub use candle::Candle;
pub use ids::PositionId;
pub use instrument::{Direction, Instrument, OptionRight};
pub use levels::{BreakoutEvent, OpeningRange};
pub use position::{ExitReason, Position, PositionStatus, Regime, StopLevel};
pub use trade::{FeesBreakdown, TradeRecord};
