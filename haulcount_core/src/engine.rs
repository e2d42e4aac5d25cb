//! Transition engine: the outside→inside state machine that credits loads.
//!
//! Manual enter/exit events and GPS-derived classifications share the same
//! two entry points; the engine has no notion of "simulated" input. Naive
//! edge-triggering on the inside boolean alone would double-count under GPS
//! flapping near the boundary, so eligibility is carried in an explicit
//! armed flag: a load is credited only on the first inside observation
//! after an outside one, and every exit re-arms.

use chrono::{DateTime, Utc};

use crate::geo::Coordinate;
use crate::ledger::{LoadLedger, LoadRecord};
use crate::registry::VehicleRegistry;
use crate::store::Snapshot;
use crate::zone::{Containment, Zone, ZoneError};

/// Outcome of a single observation.
///
/// The engine only mutates in-memory state. The caller decides what happens
/// next (persist, render, log) from the variant — persistence and
/// presentation never run inside the transition itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The vehicle crossed outside→inside while armed; one load credited.
    Entered { load: LoadRecord },

    /// Inside observation while already inside; no duplicate load.
    StillInside,

    /// The vehicle crossed inside→outside and was re-armed.
    Exited,

    /// Outside observation while already outside; re-arm is idempotent.
    StillOutside,

    /// No zone center is configured; the sample was ignored and no vehicle
    /// or ledger state changed.
    ZoneUnset,
}

/// One tracking session: the zone, the vehicles, and the counted loads.
///
/// Owns the whole mutable snapshot. Entry points are synchronous and
/// complete immediately; a host that receives observations concurrently
/// must serialize them before they reach this struct.
#[derive(Debug)]
pub struct Session {
    zone: Zone,
    registry: VehicleRegistry,
    ledger: LoadLedger,
}

impl Session {
    pub fn new(zone: Zone, ledger: LoadLedger) -> Self {
        Self {
            zone,
            registry: VehicleRegistry::new(),
            ledger,
        }
    }

    /// Fresh session: no center, default radius, default ledger cap.
    pub fn with_defaults() -> Self {
        Self::new(Zone::default(), LoadLedger::default())
    }

    /// Rebuild a session from a persisted snapshot, trimming the ledger to
    /// `ledger_capacity`.
    pub fn from_snapshot(snapshot: Snapshot, ledger_capacity: usize) -> Result<Self, ZoneError> {
        Ok(Self {
            zone: Zone::new(snapshot.center, snapshot.radius_m)?,
            registry: snapshot.vehicles,
            ledger: LoadLedger::from_records(snapshot.loads, ledger_capacity),
        })
    }

    /// Capture the whole mutable state for the persistence port. Trivially
    /// atomic under the single-threaded contract.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            vehicles: self.registry.clone(),
            loads: self.ledger.iter().cloned().collect(),
            center: self.zone.center(),
            radius_m: self.zone.radius_m(),
        }
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// Zone configuration is a boundary concern; the engine itself never
    /// mutates the zone during a transition.
    pub fn zone_mut(&mut self) -> &mut Zone {
        &mut self.zone
    }

    pub fn registry(&self) -> &VehicleRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &LoadLedger {
        &self.ledger
    }

    /// Register a vehicle without observing it. Creation also happens
    /// implicitly on the first observe call naming an unknown id.
    pub fn add_vehicle(&mut self, id: &str) {
        self.registry.ensure(id);
    }

    /// Remove a vehicle and every load record credited to it, so no orphan
    /// loads survive. Returns how many records were dropped.
    pub fn remove_vehicle(&mut self, id: &str) -> usize {
        self.registry.remove(id);
        self.ledger.remove_by_vehicle(id)
    }

    /// The current sample classified the vehicle as inside the zone.
    ///
    /// The outside→armed path is the only one that creates a load; repeated
    /// inside observations are no-ops beyond reaffirming `is_inside`.
    pub fn observe_inside(&mut self, id: &str, now: DateTime<Utc>) -> Transition {
        let vehicle = self.registry.ensure(id);
        let credited = !vehicle.is_inside && vehicle.armed_for_load;

        vehicle.is_inside = true;
        if credited {
            vehicle.armed_for_load = false;
            let load = LoadRecord {
                vehicle_id: id.to_string(),
                timestamp: now,
            };
            self.ledger.append(load.clone());
            Transition::Entered { load }
        } else {
            Transition::StillInside
        }
    }

    /// The current sample classified the vehicle as outside the zone.
    ///
    /// Re-arms unconditionally, which is what allows the next entry to
    /// count; repeated outside observations are idempotent.
    pub fn observe_outside(&mut self, id: &str) -> Transition {
        let vehicle = self.registry.ensure(id);
        let was_inside = vehicle.is_inside;

        vehicle.is_inside = false;
        vehicle.armed_for_load = true;

        if was_inside {
            Transition::Exited
        } else {
            Transition::StillOutside
        }
    }

    /// Classify a position sample against the zone and dispatch.
    ///
    /// Until a center exists the sample is ignored entirely; in particular
    /// no vehicle state is created for `id`.
    pub fn observe_position(&mut self, id: &str, point: Coordinate, now: DateTime<Utc>) -> Transition {
        match self.zone.classify(point) {
            Containment::Inside => self.observe_inside(id, now),
            Containment::Outside => self.observe_outside(id),
            Containment::Undetermined => Transition::ZoneUnset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn exit_then_enter_credits_one_load() {
        let mut session = Session::with_defaults();
        session.observe_outside("V1");
        let transition = session.observe_inside("V1", t(10));

        assert!(matches!(transition, Transition::Entered { .. }));
        assert_eq!(session.ledger().count(), 1);
    }

    #[test]
    fn repeated_inside_observations_do_not_double_count() {
        let mut session = Session::with_defaults();
        session.observe_outside("V1");
        session.observe_inside("V1", t(10));
        let second = session.observe_inside("V1", t(11));

        assert_eq!(second, Transition::StillInside);
        assert_eq!(session.ledger().count(), 1);
    }

    #[test]
    fn repeated_outside_observations_stay_armed_without_loads() {
        let mut session = Session::with_defaults();
        session.observe_outside("V1");
        let second = session.observe_outside("V1");

        assert_eq!(second, Transition::StillOutside);
        let v = session.registry().get("V1").unwrap();
        assert!(v.armed_for_load);
        assert!(!v.is_inside);
        assert_eq!(session.ledger().count(), 0);
    }

    #[test]
    fn each_full_cycle_counts_once() {
        let mut session = Session::with_defaults();
        for cycle in 0..3 {
            session.observe_outside("V1");
            session.observe_inside("V1", t(cycle));
        }
        assert_eq!(session.ledger().count(), 3);
    }

    #[test]
    fn first_observation_inside_credits_immediately() {
        // Fresh vehicles are armed: assumed to have started outside.
        let mut session = Session::with_defaults();
        let transition = session.observe_inside("NEW", t(5));

        assert!(matches!(transition, Transition::Entered { .. }));
        assert_eq!(session.ledger().count(), 1);
    }

    #[test]
    fn exit_rearms_for_the_next_entry() {
        let mut session = Session::with_defaults();
        session.observe_inside("V1", t(0));
        session.observe_outside("V1");
        let v = session.registry().get("V1").unwrap();
        assert!(v.armed_for_load);

        session.observe_inside("V1", t(1));
        assert_eq!(session.ledger().count(), 2);
    }

    #[test]
    fn position_samples_are_ignored_until_a_center_exists() {
        let mut session = Session::with_defaults();
        let point = coord(59.91, 10.75);

        let transition = session.observe_position("V1", point, t(0));
        assert_eq!(transition, Transition::ZoneUnset);
        assert_eq!(session.ledger().count(), 0);
        assert!(!session.registry().contains("V1"));

        // Once the center exists, a sample at the center (distance 0) is a
        // qualifying entry.
        session.zone_mut().set_center(point);
        let transition = session.observe_position("V1", point, t(1));
        assert!(matches!(transition, Transition::Entered { .. }));
        assert_eq!(session.ledger().count(), 1);
        assert!(session.registry().get("V1").unwrap().is_inside);
    }

    #[test]
    fn position_samples_drive_exit_and_reentry() {
        let mut session = Session::with_defaults();
        let center = coord(0.0, 0.0);
        let far = coord(1.0, 0.0); // ~111 km away
        session.zone_mut().set_center(center);

        session.observe_position("V1", center, t(0));
        assert_eq!(session.observe_position("V1", far, t(1)), Transition::Exited);
        session.observe_position("V1", center, t(2));

        assert_eq!(session.ledger().count(), 2);
    }

    #[test]
    fn zone_reset_leaves_vehicle_states_untouched() {
        let mut session = Session::with_defaults();
        session.observe_inside("V1", t(0));

        session.zone_mut().reset_center();
        let v = session.registry().get("V1").unwrap();
        assert!(v.is_inside);
        assert!(!v.armed_for_load);
    }

    #[test]
    fn removing_a_vehicle_cascades_to_its_loads() {
        let mut session = Session::with_defaults();
        for cycle in 0..3 {
            session.observe_outside("V1");
            session.observe_inside("V1", t(cycle * 2));
        }
        session.observe_inside("V2", t(100));

        assert_eq!(session.ledger().count(), 4);
        assert_eq!(session.remove_vehicle("V1"), 3);
        assert_eq!(session.ledger().count(), 1);
        assert_eq!(session.ledger().recent(1)[0].vehicle_id, "V2");
        assert!(!session.registry().contains("V1"));
    }

    #[test]
    fn snapshot_round_trip_preserves_state() {
        let mut session = Session::with_defaults();
        session.zone_mut().set_center(coord(59.91, 10.75));
        session.zone_mut().set_radius(250.0).unwrap();
        session.observe_inside("V1", t(0));
        session.observe_outside("V2");

        let snapshot = session.snapshot();
        let restored = Session::from_snapshot(snapshot, 5000).unwrap();

        assert_eq!(restored.zone(), session.zone());
        assert_eq!(restored.registry(), session.registry());
        assert_eq!(restored.ledger().count(), 1);
    }
}
