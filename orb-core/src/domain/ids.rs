use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::instrument::Direction;

/// Position ID, unique across days and directions.
///
/// Derived from the trading day, the direction slot and the 1-based entry
/// number within that slot, so IDs stay stable when days run in parallel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId {
    pub date: NaiveDate,
    pub direction: Direction,
    pub entry_number: u32,
}

impl PositionId {
    pub fn new(date: NaiveDate, direction: Direction, entry_number: u32) -> Self {
        Self {
            date,
            direction,
            entry_number,
        }
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.date, self.direction, self.entry_number)
    }
}
