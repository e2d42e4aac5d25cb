//! Haulcount Core - Geofence Transition Tracking and Load Counting
//!
//! One "load" is credited each time a vehicle completes a confirmed
//! outside→inside cycle against a single circular geofence. This crate holds:
//! 1. **Geo Math**: haversine great-circle distance
//! 2. **Zone Model**: center + radius with three-valued containment
//! 3. **Transition Engine**: the armed/disarmed state machine per vehicle
//! 4. **Load Ledger**: capacity-bounded record of counted loads
//! 5. **Persistence Port**: whole-snapshot load/save over sled
//!
//! Position acquisition and rendering live with the caller; the engine only
//! ever sees inside/outside classifications and explicit coordinates.

pub mod engine;
pub mod export;
pub mod geo;
pub mod ledger;
pub mod registry;
pub mod store;
pub mod zone;

// Re-export key types for convenience
pub use engine::{Session, Transition};
pub use geo::{distance_meters, Coordinate, GeoError};
pub use ledger::{LoadLedger, LoadRecord};
pub use registry::{VehicleRegistry, VehicleState};
pub use store::{SledSnapshotStore, Snapshot, SnapshotStore, StoreError};
pub use zone::{Containment, Zone, ZoneError};
