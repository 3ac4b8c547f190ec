//! Trade Ledger — append-only sink for closed trades.

use std::sync::Mutex;

use crate::domain::TradeRecord;

/// Append-only trade sink shared by both direction slots and, in batch
/// backtests, by every worker thread.
pub trait TradeLedger: Send + Sync {
    fn append(&self, record: TradeRecord);

    /// Append a batch as one unit; no other writer interleaves with it.
    fn append_all(&self, records: Vec<TradeRecord>) {
        for record in records {
            self.append(record);
        }
    }

    /// Copy of every record appended so far, in append order.
    fn records(&self) -> Vec<TradeRecord>;

    fn len(&self) -> usize {
        self.records().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory ledger behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: Mutex<Vec<TradeRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the ledger and return its records.
    pub fn into_records(self) -> Vec<TradeRecord> {
        match self.records.into_inner() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<TradeRecord>> {
        // Writes are a single push or extend; a poisoned guard still holds whole records.
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl TradeLedger for MemoryLedger {
    fn append(&self, record: TradeRecord) {
        self.lock().push(record);
    }

    fn append_all(&self, records: Vec<TradeRecord>) {
        self.lock().extend(records);
    }

    fn records(&self) -> Vec<TradeRecord> {
        self.lock().clone()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}
