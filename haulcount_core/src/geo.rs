//! Great-circle geometry for geofence classification.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in meters, as used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Coordinate validation errors, raised at the system boundary only.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A WGS84 position in signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, [-90, 90]
    pub lat: f64,

    /// Longitude in degrees, [-180, 180]
    pub lon: f64,
}

impl Coordinate {
    /// Validate and build a coordinate.
    ///
    /// Validation happens here, at the boundary; the distance math below
    /// assumes its inputs are already valid and never fails.
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeoError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::LatitudeOutOfRange(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(GeoError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }
}

/// Haversine great-circle distance between two coordinates, in meters.
///
/// Symmetric within floating-point tolerance, and exactly zero when both
/// arguments are the same point.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}
