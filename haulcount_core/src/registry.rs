//! Vehicle registry: per-vehicle transition state keyed by an opaque id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Transition state for a single vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleState {
    /// Opaque identifier, unique within the registry
    pub id: String,

    /// Whether the last confirmed observation placed the vehicle inside
    pub is_inside: bool,

    /// True while the vehicle is eligible to produce a load on its next
    /// outside→inside transition. Fresh vehicles start armed: a vehicle is
    /// assumed to have started outside the zone.
    pub armed_for_load: bool,
}

impl VehicleState {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            is_inside: false,
            armed_for_load: true,
        }
    }
}

/// All known vehicles, created on first reference.
///
/// Iteration order is insertion order so display lists stay stable across
/// renders; correctness never depends on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleRegistry {
    vehicles: HashMap<String, VehicleState>,
    order: Vec<String>,
}

impl VehicleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the state for `id`, creating the default state on first
    /// reference. Idempotent.
    pub fn ensure(&mut self, id: &str) -> &mut VehicleState {
        if !self.vehicles.contains_key(id) {
            self.order.push(id.to_string());
        }
        self.vehicles
            .entry(id.to_string())
            .or_insert_with(|| VehicleState::new(id))
    }

    pub fn get(&self, id: &str) -> Option<&VehicleState> {
        self.vehicles.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.vehicles.contains_key(id)
    }

    /// Remove a vehicle. Unknown ids are a no-op, not an error; returns
    /// whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.vehicles.remove(id).is_some();
        if removed {
            self.order.retain(|known| known != id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Read-only snapshot in insertion order, for display.
    pub fn iter(&self) -> impl Iterator<Item = &VehicleState> {
        self.order.iter().filter_map(|id| self.vehicles.get(id))
    }
}
