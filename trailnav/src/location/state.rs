//! Core value types for the location pipeline.
//!
//! - [`LocationFix`] - A single position sample with motion data
//! - [`HeadingFix`] - A single compass heading sample
//! - [`SourceKind`] - Which producer is feeding the hub
//! - [`AuthorizationStatus`] - Platform permission state for a source
//! - [`LocationEvent`] / [`SourceEvent`] - Typed events flowing in and out of the hub

use std::fmt;
use std::time::{Duration, SystemTime};

use crate::trail::GeoCoordinate;

use super::source::SourceError;

/// Course value meaning "no valid bearing".
pub const INVALID_COURSE: f64 = -1.0;

/// A single location sample.
///
/// Produced either by a real source or by the trail path simulator.
/// Fixes are immutable values; consumers receive clones.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFix {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,

    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,

    /// Altitude in meters.
    pub altitude: f64,

    /// Radius of uncertainty in meters.
    pub horizontal_accuracy: f64,

    /// Direction of travel in degrees (0-360), or [`INVALID_COURSE`].
    pub course: f64,

    /// Speed in meters per second.
    pub speed: f64,

    /// When this fix was measured.
    pub timestamp: SystemTime,
}

impl LocationFix {
    /// Create a fix at the current time with no motion data.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: 0.0,
            horizontal_accuracy: 0.0,
            course: INVALID_COURSE,
            speed: 0.0,
            timestamp: SystemTime::now(),
        }
    }

    /// Returns a copy with a different timestamp.
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Coordinate of this fix.
    pub fn coordinate(&self) -> GeoCoordinate {
        GeoCoordinate::new(self.latitude, self.longitude)
    }

    /// Returns true if `course` carries a bearing.
    pub fn has_valid_course(&self) -> bool {
        self.course >= 0.0
    }

    /// Age of this fix relative to now.
    ///
    /// Fixes stamped in the future are treated as zero age.
    pub fn age(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.timestamp)
            .unwrap_or(Duration::ZERO)
    }
}

/// A single heading sample.
///
/// Only real sources produce headings; the simulator never does.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingFix {
    /// True heading in degrees (0-360).
    pub true_heading: f64,

    /// When this heading was measured.
    pub timestamp: SystemTime,
}

impl HeadingFix {
    /// Create a heading sample at the current time.
    pub fn new(true_heading: f64) -> Self {
        Self {
            true_heading,
            timestamp: SystemTime::now(),
        }
    }
}

/// Producer currently feeding the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Device or network GPS.
    Real,
    /// Synthetic fixes generated along a trail path.
    Simulated,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real => write!(f, "Real"),
            Self::Simulated => write!(f, "Simulated"),
        }
    }
}

/// Permission state reported by the platform for a location source.
///
/// Read-only: the pipeline never prompts for permission itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet.
    #[default]
    NotDetermined,
    /// Access was refused or the source cannot be used.
    Denied,
    /// Access granted while the app is in use.
    AuthorizedWhenInUse,
    /// Access granted at all times.
    AuthorizedAlways,
}

impl AuthorizationStatus {
    /// Returns true if fixes may be requested.
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::AuthorizedWhenInUse | Self::AuthorizedAlways)
    }
}

impl fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDetermined => write!(f, "Not determined"),
            Self::Denied => write!(f, "Denied"),
            Self::AuthorizedWhenInUse => write!(f, "When in use"),
            Self::AuthorizedAlways => write!(f, "Always"),
        }
    }
}

/// Event published by the hub on its broadcast channel.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    Location(LocationFix),
    Heading(HeadingFix),
}

/// Event emitted by a producer toward the hub.
#[derive(Debug)]
pub enum SourceEvent {
    Location(LocationFix),
    Heading(HeadingFix),
    Failed(SourceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_fix_has_invalid_course() {
        let fix = LocationFix::new(39.5, -105.5);
        assert_eq!(fix.course, INVALID_COURSE);
        assert!(!fix.has_valid_course());
        assert_eq!(fix.coordinate(), GeoCoordinate::new(39.5, -105.5));
    }

    #[test]
    fn test_course_zero_is_valid() {
        let fix = LocationFix {
            course: 0.0,
            ..LocationFix::new(0.0, 0.0)
        };
        assert!(fix.has_valid_course());
    }

    #[test]
    fn test_fix_age() {
        let old = LocationFix::new(0.0, 0.0)
            .with_timestamp(SystemTime::now() - Duration::from_secs(30));
        assert!(old.age() >= Duration::from_secs(29));

        let future = LocationFix::new(0.0, 0.0)
            .with_timestamp(SystemTime::now() + Duration::from_secs(30));
        assert_eq!(future.age(), Duration::ZERO);
    }

    #[test]
    fn test_authorization_status() {
        assert!(!AuthorizationStatus::NotDetermined.is_authorized());
        assert!(!AuthorizationStatus::Denied.is_authorized());
        assert!(AuthorizationStatus::AuthorizedWhenInUse.is_authorized());
        assert!(AuthorizationStatus::AuthorizedAlways.is_authorized());
        assert_eq!(AuthorizationStatus::default(), AuthorizationStatus::NotDetermined);
    }

    #[test]
    fn test_source_kind_display() {
        assert_eq!(SourceKind::Real.to_string(), "Real");
        assert_eq!(SourceKind::Simulated.to_string(), "Simulated");
    }
}
