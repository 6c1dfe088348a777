//! Trail geometry and drive definitions.
//!
//! - [`geo`] - Distance, bearing and interpolation on geographic coordinates
//! - [`path`] - `TrailPath`, an immutable polyline sampled by distance
//! - [`drive`] - `TrailDrive`, its waypoints and evaluator-facing `WaypointInfo`
//! - [`io`] - Plain-text path files

pub mod drive;
pub mod geo;
pub mod io;
pub mod path;

pub use drive::{DriveWaypoint, TrailDrive, WaypointDirection, WaypointId, WaypointInfo};
pub use geo::{bearing_degrees, bearing_difference, distance_meters, interpolate, GeoCoordinate};
pub use io::{load_path, parse_path, PathFileError};
pub use path::{PathProjection, TrailPath, TrailPathError};
