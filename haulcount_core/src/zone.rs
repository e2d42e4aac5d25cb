//! Circular geofence model: an optional center plus a radius.
//!
//! The center is absent until first established (typically from the first
//! GPS fix); classification against a center-less zone is a real third
//! state, never a defaulted boolean.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{distance_meters, Coordinate};

/// Radius applied when none has been configured.
pub const DEFAULT_RADIUS_M: f64 = 100.0;

/// Smallest radius the boundary accepts. Values at or below this are
/// rejected before they reach the zone.
pub const MIN_RADIUS_M: f64 = 5.0;

/// Zone configuration errors, raised at the boundary.
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("radius must be a number greater than {MIN_RADIUS_M} m, got {0}")]
    InvalidRadius(f64),
}

/// Where a point sits relative to the zone.
///
/// `Undetermined` means no center exists yet. Callers must skip the
/// transition step on this variant instead of assuming inside or outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    Inside,
    Outside,
    Undetermined,
}

/// A single circular geofence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    center: Option<Coordinate>,
    radius_m: f64,
}

impl Default for Zone {
    fn default() -> Self {
        Self {
            center: None,
            radius_m: DEFAULT_RADIUS_M,
        }
    }
}

impl Zone {
    /// Build a zone from persisted or caller-supplied configuration,
    /// re-applying the radius bound.
    pub fn new(center: Option<Coordinate>, radius_m: f64) -> Result<Self, ZoneError> {
        let mut zone = Self {
            center,
            radius_m: DEFAULT_RADIUS_M,
        };
        zone.set_radius(radius_m)?;
        Ok(zone)
    }

    pub fn center(&self) -> Option<Coordinate> {
        self.center
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// Establish or move the center. Vehicle states are never touched by
    /// zone mutation; only classification of future samples changes.
    pub fn set_center(&mut self, center: Coordinate) {
        self.center = Some(center);
    }

    /// Clear the center back to absent. Subsequent classifications return
    /// [`Containment::Undetermined`] until a new center is set.
    pub fn reset_center(&mut self) {
        self.center = None;
    }

    /// Update the radius, enforcing the boundary bound (> [`MIN_RADIUS_M`]).
    /// On rejection the previous radius is left unchanged.
    pub fn set_radius(&mut self, radius_m: f64) -> Result<(), ZoneError> {
        if !radius_m.is_finite() || radius_m <= MIN_RADIUS_M {
            return Err(ZoneError::InvalidRadius(radius_m));
        }
        self.radius_m = radius_m;
        Ok(())
    }

    /// Distance from the configured center to `point`, if a center exists.
    pub fn distance_to(&self, point: Coordinate) -> Option<f64> {
        self.center.map(|c| distance_meters(c, point))
    }

    /// Classify a point against the zone.
    ///
    /// The boundary itself counts as inside (`<=`), so a sample landing
    /// exactly on the radius never flips to outside on equality.
    pub fn classify(&self, point: Coordinate) -> Containment {
        match self.distance_to(point) {
            None => Containment::Undetermined,
            Some(d) if d <= self.radius_m => Containment::Inside,
            Some(_) => Containment::Outside,
        }
    }
}
