//! Trail drives and their waypoints.
//!
//! A drive is one planned traversal of a trail. It is plain data: the
//! navigation evaluator decides how fixes relate to its waypoints.

use std::fmt;

use super::geo::GeoCoordinate;
use super::path::TrailPath;

/// Identifier of a waypoint within a drive.
pub type WaypointId = u64;

/// Direction of a waypoint relative to the driver's position on the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointDirection {
    /// The driver is at the waypoint.
    AtPoint,
    /// The waypoint lies ahead in the direction of travel.
    Forward,
    /// The waypoint lies behind the driver.
    Backward,
}

impl fmt::Display for WaypointDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtPoint => write!(f, "At point"),
            Self::Forward => write!(f, "Forward"),
            Self::Backward => write!(f, "Backward"),
        }
    }
}

/// A named point of interest along a drive.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveWaypoint {
    pub id: WaypointId,
    pub name: String,
    pub coordinate: GeoCoordinate,
    /// Distance marker along the drive's path.
    pub distance_from_start_m: f64,
}

/// One planned traversal of a trail's path.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailDrive {
    pub id: u64,
    pub name: String,
    /// Waypoints ordered by `distance_from_start_m`.
    pub waypoints: Vec<DriveWaypoint>,
}

impl TrailDrive {
    /// Create a drive, ordering its waypoints by distance marker.
    pub fn new(id: u64, name: impl Into<String>, mut waypoints: Vec<DriveWaypoint>) -> Self {
        waypoints.sort_by(|a, b| a.distance_from_start_m.total_cmp(&b.distance_from_start_m));
        Self {
            id,
            name: name.into(),
            waypoints,
        }
    }

    /// Build a drive with one waypoint per path coordinate.
    ///
    /// Waypoints are named "Start", "Point 2", ..., "End", with distances
    /// taken from the path.
    pub fn from_path(id: u64, name: impl Into<String>, path: &TrailPath) -> Self {
        let distances = path.vertex_distances();
        let last = distances.len() - 1;
        let waypoints = path
            .coordinates()
            .iter()
            .zip(distances)
            .enumerate()
            .map(|(i, (coordinate, distance))| DriveWaypoint {
                id: i as WaypointId + 1,
                name: match i {
                    _ if i == last => "End".to_string(),
                    0 => "Start".to_string(),
                    _ => format!("Point {}", i + 1),
                },
                coordinate: *coordinate,
                distance_from_start_m: distance,
            })
            .collect();
        Self::new(id, name, waypoints)
    }

    /// Look up a waypoint by id.
    pub fn waypoint(&self, id: WaypointId) -> Option<&DriveWaypoint> {
        self.waypoints.iter().find(|w| w.id == id)
    }

    /// The final waypoint of the drive, if any.
    pub fn last_waypoint(&self) -> Option<&DriveWaypoint> {
        self.waypoints.last()
    }
}

/// Snapshot of a waypoint as reported by the navigation evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointInfo {
    pub waypoint_id: WaypointId,
    pub name: String,
    pub direction: WaypointDirection,
    /// Distance from the current fix to the waypoint, when known.
    pub distance_meters: Option<f64>,
}

impl WaypointInfo {
    /// Build a snapshot for a drive waypoint.
    pub fn from_waypoint(
        waypoint: &DriveWaypoint,
        direction: WaypointDirection,
        distance_meters: Option<f64>,
    ) -> Self {
        Self {
            waypoint_id: waypoint.id,
            name: waypoint.name.clone(),
            direction,
            distance_meters,
        }
    }
}
