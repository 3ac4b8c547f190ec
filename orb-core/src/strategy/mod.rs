//! Signal side of the engine: range, breakout, entry trigger, filter and
//! contract selection. Everything here is stateless or day-scoped.

pub mod breakout;
pub mod entry;
pub mod filter;
pub mod opening_range;
pub mod selector;

pub use breakout::BreakoutDetector;
pub use entry::{check_entry, stop_touched_first, structural_breach};
pub use filter::{EntryFilter, FixedIndicators, IndicatorSource, TrendDirection};
pub use opening_range::OpeningRangeTracker;
pub use selector::{nearest_expiry, select_strike, OptionChain, OptionSelector};
