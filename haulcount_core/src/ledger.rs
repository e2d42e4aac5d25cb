//! Append-only, capacity-bounded record of counted loads.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default record cap. This is a memory guard, not a business rule; the
/// constructor takes the cap so tests can run with tiny ones.
pub const DEFAULT_CAPACITY: usize = 5000;

/// One counted load: a vehicle completed an outside→inside cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRecord {
    pub vehicle_id: String,

    /// UTC instant the load was credited, millisecond precision or finer
    pub timestamp: DateTime<Utc>,
}

/// Insertion-ordered sequence of load records, bounded to the most recent
/// `capacity` entries with FIFO eviction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadLedger {
    records: VecDeque<LoadRecord>,
    capacity: usize,
}

impl Default for LoadLedger {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LoadLedger {
    /// Create an empty ledger bounded to `capacity` records.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "ledger capacity must be positive");
        Self {
            records: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Rebuild a ledger from persisted records, oldest first, trimming to
    /// `capacity` by evicting from the head.
    pub fn from_records(records: Vec<LoadRecord>, capacity: usize) -> Self {
        let mut ledger = Self::new(capacity);
        for record in records {
            ledger.append(record);
        }
        ledger
    }

    /// Append a record to the tail, evicting the oldest first when at
    /// capacity. O(1) amortized.
    pub fn append(&mut self, record: LoadRecord) {
        if self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// The last `n` records, most recent first. Never mutates.
    pub fn recent(&self, n: usize) -> Vec<&LoadRecord> {
        self.records.iter().rev().take(n).collect()
    }

    /// Cascading delete used by vehicle removal: drops every record for
    /// `id`, preserving the relative order of the remainder. Returns how
    /// many records were dropped.
    pub fn remove_by_vehicle(&mut self, id: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.vehicle_id != id);
        before - self.records.len()
    }

    /// Number of records currently held, post-eviction.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest-first iteration, used by the CSV export.
    pub fn iter(&self) -> impl Iterator<Item = &LoadRecord> {
        self.records.iter()
    }
}
