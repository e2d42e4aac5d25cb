//! Persistence port: whole-snapshot load/save.
//!
//! The port only ever reads or writes the complete [`Snapshot`], never
//! individual fields. A failed save leaves the in-memory session intact and
//! the previously persisted snapshot as last known good; the caller reports
//! the failure instead of retrying transparently.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Coordinate;
use crate::ledger::LoadRecord;
use crate::registry::VehicleRegistry;

/// Fixed key the snapshot JSON lives under in the sled tree.
const SNAPSHOT_KEY: &[u8] = b"haulcount_snapshot_v1";

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("snapshot serialization error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// The whole persisted state of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub vehicles: VehicleRegistry,

    /// Load records, oldest first
    pub loads: Vec<LoadRecord>,

    pub center: Option<Coordinate>,
    pub radius_m: f64,
}

/// Durable storage for session snapshots.
pub trait SnapshotStore {
    /// Read the last persisted snapshot, or `None` on first run.
    fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Replace the persisted snapshot wholesale.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// Sled-backed snapshot store
///
/// Uses an embedded key-value database for durability; the snapshot is one
/// JSON value under a fixed key, flushed on every save.
pub struct SledSnapshotStore {
    db: sled::Db,
}

impl SledSnapshotStore {
    /// Open a persistent store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)
            .map_err(|e| StoreError::Storage(format!("failed to open sled DB: {}", e)))?;
        Ok(Self { db })
    }

    /// Create a temporary store (for testing)
    #[cfg(test)]
    pub fn open_temp() -> Result<Self, StoreError> {
        let config = sled::Config::new().temporary(true);
        let db = config
            .open()
            .map_err(|e| StoreError::Storage(format!("failed to open temp DB: {}", e)))?;
        Ok(Self { db })
    }
}

impl SnapshotStore for SledSnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let bytes = self
            .db
            .get(SNAPSHOT_KEY)
            .map_err(|e| StoreError::Storage(format!("read failed: {}", e)))?;

        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(snapshot)?;
        self.db
            .insert(SNAPSHOT_KEY, bytes)
            .map_err(|e| StoreError::Storage(format!("insert failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| StoreError::Storage(format!("flush failed: {}", e)))?;
        Ok(())
    }
}
