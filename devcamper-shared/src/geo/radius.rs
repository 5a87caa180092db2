//! Great-circle distance math for the bootcamp radius search.
//!
//! A search is a spherical cap: every point whose angular distance from the
//! center is at most `distance / EARTH_RADIUS_MILES` radians.

/// Earth's mean radius in miles
pub const EARTH_RADIUS_MILES: f64 = 3963.0;

/// Angular distance in radians between two points given in degrees
///
/// Haversine form; stable for small distances.
pub fn angular_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * a.clamp(0.0, 1.0).sqrt().asin()
}

/// A circular search region on the sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalCap {
    pub center_lat: f64,
    pub center_lng: f64,
    /// Cap radius in radians
    pub radius: f64,
}

impl SphericalCap {
    /// Builds a cap around a center from a distance in miles
    ///
    /// Returns `None` unless the distance is a finite, positive number.
    pub fn from_miles(center_lat: f64, center_lng: f64, distance_miles: f64) -> Option<Self> {
        if !distance_miles.is_finite() || distance_miles <= 0.0 {
            return None;
        }

        Some(Self {
            center_lat,
            center_lng,
            radius: distance_miles / EARTH_RADIUS_MILES,
        })
    }

    /// Whether a point lies inside the cap (boundary inclusive)
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        angular_distance(self.center_lat, self.center_lng, lat, lng) <= self.radius
    }
}
