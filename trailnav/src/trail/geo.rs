//! Geodesy helpers for trail geometry.
//!
//! All functions use a spherical earth model, which is accurate to well under
//! a meter over the segment lengths found in trail paths.
//!
//! # Coordinate System
//!
//! - Latitude: degrees north (-90 to 90)
//! - Longitude: degrees east (-180 to 180)
//! - Bearing: degrees true (0-360, 0=north, 90=east)
//! - Distance: meters

use std::f64::consts::PI;
use std::fmt;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Degrees to radians conversion factor.
const DEG_TO_RAD: f64 = PI / 180.0;

/// Radians to degrees conversion factor.
const RAD_TO_DEG: f64 = 180.0 / PI;

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoordinate {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Create a new coordinate.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true if both components are finite and within valid ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Calculate the great-circle distance between two coordinates.
///
/// Uses the haversine formula for accuracy over short distances.
///
/// # Example
///
/// ```
/// use trailnav::trail::{distance_meters, GeoCoordinate};
///
/// let a = GeoCoordinate::new(0.0, 0.0);
/// let b = GeoCoordinate::new(1.0, 0.0);
/// assert!((distance_meters(a, b) - 111_195.0).abs() < 10.0);
/// ```
pub fn distance_meters(from: GeoCoordinate, to: GeoCoordinate) -> f64 {
    let lat1_rad = from.latitude * DEG_TO_RAD;
    let lat2_rad = to.latitude * DEG_TO_RAD;
    let delta_lat = (to.latitude - from.latitude) * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Calculate the initial bearing from one coordinate to another.
///
/// Returns the forward azimuth in degrees (0-360, 0=north, 90=east).
/// Identical coordinates yield 0.
pub fn bearing_degrees(from: GeoCoordinate, to: GeoCoordinate) -> f64 {
    let lat1_rad = from.latitude * DEG_TO_RAD;
    let lat2_rad = to.latitude * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    let y = delta_lon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();

    normalize_bearing(y.atan2(x) * RAD_TO_DEG)
}

/// Interpolate a coordinate at `fraction` (0..=1) of the way from `from` to `to`.
///
/// Interpolation is linear in latitude/longitude, which matches the way trail
/// geometry is digitized (short straight segments).
pub fn interpolate(from: GeoCoordinate, to: GeoCoordinate, fraction: f64) -> GeoCoordinate {
    let t = fraction.clamp(0.0, 1.0);
    GeoCoordinate {
        latitude: from.latitude + (to.latitude - from.latitude) * t,
        longitude: from.longitude + (to.longitude - from.longitude) * t,
    }
}

/// Normalize a bearing to [0, 360) degrees.
pub fn normalize_bearing(bearing: f64) -> f64 {
    let mut b = bearing % 360.0;
    if b < 0.0 {
        b += 360.0;
    }
    b
}

/// Smallest angle between two bearings, in degrees (0-180).
pub fn bearing_difference(a: f64, b: f64) -> f64 {
    let diff = normalize_bearing(a - b);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_one_degree_latitude() {
        let d = distance_meters(GeoCoordinate::new(0.0, 0.0), GeoCoordinate::new(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn test_distance_zero() {
        let p = GeoCoordinate::new(39.7392, -104.9903);
        assert_eq!(distance_meters(p, p), 0.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = GeoCoordinate::new(39.7392, -104.9903);
        let b = GeoCoordinate::new(39.7500, -105.0100);
        assert!((distance_meters(a, b) - distance_meters(b, a)).abs() < 1e-6);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GeoCoordinate::new(0.0, 0.0);
        let north = bearing_degrees(origin, GeoCoordinate::new(1.0, 0.0));
        let east = bearing_degrees(origin, GeoCoordinate::new(0.0, 1.0));
        let south = bearing_degrees(origin, GeoCoordinate::new(-1.0, 0.0));
        let west = bearing_degrees(origin, GeoCoordinate::new(0.0, -1.0));

        assert!(north.abs() < 0.01 || (north - 360.0).abs() < 0.01);
        assert!((east - 90.0).abs() < 0.01);
        assert!((south - 180.0).abs() < 0.01);
        assert!((west - 270.0).abs() < 0.01);
    }

    #[test]
    fn test_interpolate_midpoint() {
        let a = GeoCoordinate::new(10.0, 20.0);
        let b = GeoCoordinate::new(12.0, 24.0);
        let mid = interpolate(a, b, 0.5);
        assert!((mid.latitude - 11.0).abs() < 1e-12);
        assert!((mid.longitude - 22.0).abs() < 1e-12);
    }

    #[test]
    fn test_interpolate_clamps_fraction() {
        let a = GeoCoordinate::new(10.0, 20.0);
        let b = GeoCoordinate::new(12.0, 24.0);
        assert_eq!(interpolate(a, b, -1.0), a);
        assert_eq!(interpolate(a, b, 2.0), b);
    }

    #[test]
    fn test_normalize_bearing() {
        assert_eq!(normalize_bearing(-90.0), 270.0);
        assert_eq!(normalize_bearing(450.0), 90.0);
        assert_eq!(normalize_bearing(0.0), 0.0);
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(GeoCoordinate::new(45.0, 90.0).is_valid());
        assert!(!GeoCoordinate::new(91.0, 0.0).is_valid());
        assert!(!GeoCoordinate::new(0.0, f64::NAN).is_valid());
    }

    #[test]
    fn test_bearing_difference() {
        assert_eq!(bearing_difference(10.0, 350.0), 20.0);
        assert_eq!(bearing_difference(90.0, 270.0), 180.0);
        assert_eq!(bearing_difference(45.0, 45.0), 0.0);
    }
}
