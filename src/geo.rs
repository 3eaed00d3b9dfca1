//! Geographic value types shared by the tracker, the viewport and the gym directory.
//!
//! Distances are computed on a spherical earth: each coordinate is lifted to a unit
//! [`nalgebra::Vector3<f64>`] and the great-circle distance is the angle between the two
//! vectors times the mean earth radius. That is accurate to well under a meter at the
//! scales this crate cares about (position filtering, "nearby" ordering).

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Builds a coordinate, rejecting non-finite or out-of-range components.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    pub fn is_valid(&self) -> bool {
        Self::new(self.latitude, self.longitude).is_some()
    }

    /// Unit vector pointing at this coordinate from the earth's center.
    pub fn to_unit_vector(&self) -> Vector3<f64> {
        let lat = self.latitude.to_radians();
        let lon = self.longitude.to_radians();
        Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
    }

    /// Great-circle distance to `other`, in meters.
    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        let a = self.to_unit_vector();
        let b = other.to_unit_vector();
        // atan2 of |a x b| and a . b stays well-conditioned for tiny angles, unlike acos.
        let angle = a.cross(&b).norm().atan2(a.dot(&b));
        angle * EARTH_RADIUS_M
    }
}

/// A one-shot "fly to" instruction for the map view.
///
/// The duration is unsigned, so every target carries a finite, non-negative transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTarget {
    pub coordinate: Coordinate,
    pub zoom_level: f64,
    pub transition_duration_ms: u64,
}
