//! Proximity evaluator.
//!
//! A simple [`TrailNavigator`] that projects each fix onto the drive's path:
//!
//! - fixes farther than `off_route_tolerance_m` from the path are `TrailLost`
//! - a course pointing against the path segment is `WrongDirection`
//! - passing within `arrival_radius_m` of a waypoint reports it `AtPoint`
//! - passing the last waypoint reports the trail end; later fixes are ignored
//!
//! Inaccurate and duplicate fixes are ignored.

use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use crate::location::LocationFix;
use crate::trail::{bearing_difference, TrailDrive, TrailPath, WaypointDirection, WaypointInfo};

use super::navigator::{
    NavigationError, NavigationSituation, NavigatorListener, TrailNavigator,
};

/// Tolerances for the proximity evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityConfig {
    /// Distance along the path within which a waypoint counts as reached.
    pub arrival_radius_m: f64,

    /// Maximum distance from the path before the trail is considered lost.
    pub off_route_tolerance_m: f64,

    /// Course deviation from the path beyond which travel is reversed.
    pub wrong_direction_angle_deg: f64,

    /// Minimum speed for the course to be trusted.
    pub min_course_speed_mps: f64,

    /// Fixes less accurate than this are ignored.
    pub max_horizontal_accuracy_m: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            arrival_radius_m: 25.0,
            off_route_tolerance_m: 75.0,
            wrong_direction_angle_deg: 120.0,
            min_course_speed_mps: 1.0,
            max_horizontal_accuracy_m: 100.0,
        }
    }
}

#[derive(Default)]
struct Progress {
    next_index: usize,
    finished: bool,
    last_fix: Option<(f64, f64, SystemTime)>,
}

/// Evaluates fixes against a drive laid along a path.
pub struct ProximityNavigator {
    path: TrailPath,
    drive: TrailDrive,
    config: ProximityConfig,
    progress: Mutex<Progress>,
}

impl ProximityNavigator {
    /// Build an evaluator for `drive` along `path`.
    ///
    /// Fails if the drive has no waypoints.
    pub fn new(
        path: TrailPath,
        drive: TrailDrive,
        config: ProximityConfig,
    ) -> Result<Self, NavigationError> {
        if drive.waypoints.is_empty() {
            return Err(NavigationError::InvalidDrive {
                reason: format!("drive '{}' has no waypoints", drive.name),
            });
        }
        Ok(Self {
            path,
            drive,
            config,
            progress: Mutex::new(Progress::default()),
        })
    }

    /// Build a navigator for a drive with one waypoint per path coordinate.
    pub fn for_path(
        path: TrailPath,
        name: &str,
        config: ProximityConfig,
    ) -> Result<Self, NavigationError> {
        let drive = TrailDrive::from_path(1, name, &path);
        Self::new(path, drive, config)
    }

    /// The drive being evaluated.
    pub fn drive(&self) -> &TrailDrive {
        &self.drive
    }

    fn is_noise(&self, fix: &LocationFix, progress: &Progress) -> bool {
        if fix.horizontal_accuracy > self.config.max_horizontal_accuracy_m {
            return true;
        }
        matches!(
            progress.last_fix,
            Some((lat, lon, ts)) if lat == fix.latitude && lon == fix.longitude && ts == fix.timestamp
        )
    }

    fn is_reversed(&self, fix: &LocationFix, segment_bearing: Option<f64>) -> bool {
        match segment_bearing {
            Some(bearing)
                if fix.has_valid_course() && fix.speed >= self.config.min_course_speed_mps =>
            {
                bearing_difference(fix.course, bearing) > self.config.wrong_direction_angle_deg
            }
            _ => false,
        }
    }
}

impl TrailNavigator for ProximityNavigator {
    fn evaluate_location(
        &self,
        fix: &LocationFix,
        listener: &dyn NavigatorListener,
    ) -> Result<(), NavigationError> {
        if !fix.coordinate().is_valid() {
            return Err(NavigationError::InvalidFix {
                reason: format!("coordinate {} out of range", fix.coordinate()),
            });
        }

        let mut progress = self.progress.lock().unwrap_or_else(PoisonError::into_inner);
        if progress.finished || self.is_noise(fix, &progress) {
            listener.on_location_ignored(fix);
            return Ok(());
        }
        progress.last_fix = Some((fix.latitude, fix.longitude, fix.timestamp));

        let projection = self.path.project(fix.coordinate());
        if projection.offset_m > self.config.off_route_tolerance_m {
            listener.on_trail_lost(fix);
            return Ok(());
        }
        if self.is_reversed(fix, projection.segment_bearing) {
            listener.on_wrong_direction(fix);
            return Ok(());
        }

        let position = projection.distance_from_start_m;
        let waypoints = &self.drive.waypoints;
        let mut reached = None;
        while let Some(waypoint) = waypoints.get(progress.next_index) {
            if waypoint.distance_from_start_m > position + self.config.arrival_radius_m {
                break;
            }
            reached = Some(waypoint);
            progress.next_index += 1;
        }

        if let Some(waypoint) = reached {
            let distance = (waypoint.distance_from_start_m - position).abs();
            let situation = NavigationSituation {
                next_waypoint: WaypointInfo::from_waypoint(
                    waypoint,
                    WaypointDirection::AtPoint,
                    Some(distance),
                ),
            };
            if progress.next_index >= waypoints.len() {
                progress.finished = true;
                tracing::info!(drive = %self.drive.name, "Trail end reached");
                listener.on_trail_end_reached(fix, &situation);
            } else {
                listener.on_change(fix, &situation);
            }
            return Ok(());
        }

        // Nothing reached, so the next waypoint lies ahead along the path.
        let Some(next) = waypoints.get(progress.next_index) else {
            listener.on_location_ignored(fix);
            return Ok(());
        };
        let direction = match projection.segment_bearing {
            Some(bearing)
                if fix.has_valid_course()
                    && fix.speed >= self.config.min_course_speed_mps
                    && bearing_difference(fix.course, bearing) > 90.0 =>
            {
                WaypointDirection::Backward
            }
            _ => WaypointDirection::Forward,
        };
        let situation = NavigationSituation {
            next_waypoint: WaypointInfo::from_waypoint(
                next,
                direction,
                Some(next.distance_from_start_m - position),
            ),
        };
        listener.on_change(fix, &situation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::{NavigationStatusMachine, NavigatorStatus, StagedTransitions};
    use crate::trail::GeoCoordinate;
    use std::time::Duration;

    /// Straight northbound path, 0.001 degree (~111 m) per segment.
    fn north_path() -> TrailPath {
        TrailPath::new(
            (0..4)
                .map(|i| GeoCoordinate::new(40.0 + i as f64 * 0.001, -105.0))
                .collect(),
        )
        .unwrap()
    }

    fn navigator() -> ProximityNavigator {
        ProximityNavigator::for_path(north_path(), "Demo", ProximityConfig::default()).unwrap()
    }

    fn fix(lat: f64, lon: f64, course: f64, secs: u64) -> LocationFix {
        LocationFix {
            course,
            speed: 10.0,
            horizontal_accuracy: 5.0,
            ..LocationFix::new(lat, lon)
        }
        .with_timestamp(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    fn status_after(
        nav: &ProximityNavigator,
        machine: &NavigationStatusMachine,
        fix: LocationFix,
    ) -> NavigatorStatus {
        let staged = StagedTransitions::default();
        nav.evaluate_location(&fix, &staged).unwrap();
        machine.commit(staged);
        machine.status()
    }

    #[test]
    fn test_empty_drive_rejected() {
        let err = ProximityNavigator::new(
            north_path(),
            TrailDrive::new(1, "Empty", vec![]),
            ProximityConfig::default(),
        );
        assert!(matches!(err, Err(NavigationError::InvalidDrive { .. })));
    }

    #[test]
    fn test_start_is_reported_at_point() {
        let nav = navigator();
        let machine = NavigationStatusMachine::new();

        let NavigatorStatus::Navigating { next_waypoint } =
            status_after(&nav, &machine, fix(40.0, -105.0, 0.0, 1))
        else {
            panic!("expected navigating");
        };
        assert_eq!(next_waypoint.name, "Start");
        assert_eq!(next_waypoint.direction, WaypointDirection::AtPoint);
    }

    #[test]
    fn test_next_waypoint_ahead() {
        let nav = navigator();
        let machine = NavigationStatusMachine::new();
        status_after(&nav, &machine, fix(40.0, -105.0, 0.0, 1));

        let NavigatorStatus::Navigating { next_waypoint } =
            status_after(&nav, &machine, fix(40.0005, -105.0, 0.0, 2))
        else {
            panic!("expected navigating");
        };
        assert_eq!(next_waypoint.name, "Point 2");
        assert_eq!(next_waypoint.direction, WaypointDirection::Forward);
        let distance = next_waypoint.distance_meters.unwrap();
        assert!((distance - 55.6).abs() < 1.0, "got {}", distance);
    }

    #[test]
    fn test_off_route_is_trail_lost() {
        let nav = navigator();
        let machine = NavigationStatusMachine::new();
        // ~170 m east of the path.
        let status = status_after(&nav, &machine, fix(40.001, -104.998, 0.0, 1));
        assert_eq!(status, NavigatorStatus::TrailLost);
    }

    #[test]
    fn test_reversed_course_is_wrong_direction() {
        let nav = navigator();
        let machine = NavigationStatusMachine::new();
        let status = status_after(&nav, &machine, fix(40.0015, -105.0, 180.0, 1));
        assert_eq!(status, NavigatorStatus::WrongDirection);

        // Invalid course is not judged.
        let status = status_after(&nav, &machine, fix(40.0015, -105.0, -1.0, 2));
        assert!(matches!(status, NavigatorStatus::Navigating { .. }));
    }

    #[test]
    fn test_end_is_terminal() {
        let nav = navigator();
        let machine = NavigationStatusMachine::new();
        let status = status_after(&nav, &machine, fix(40.003, -105.0, -1.0, 1));
        let NavigatorStatus::Finished { waypoint } = status else {
            panic!("expected finished");
        };
        assert_eq!(waypoint.name, "End");

        // Later fixes are ignored, so the status stays finished.
        let status = status_after(&nav, &machine, fix(40.0, -105.0, 0.0, 2));
        assert!(status.is_finished());
    }

    #[test]
    fn test_noise_is_ignored() {
        let nav = navigator();
        let machine = NavigationStatusMachine::new();
        status_after(&nav, &machine, fix(40.0015, -105.0, 0.0, 1));

        let inaccurate = LocationFix {
            horizontal_accuracy: 500.0,
            ..fix(40.5, -105.0, 0.0, 2)
        };
        let status = status_after(&nav, &machine, inaccurate);
        assert!(matches!(status, NavigatorStatus::Navigating { .. }));

        // A repeated fix is ignored.
        status_after(&nav, &machine, fix(40.001, -104.998, 0.0, 3));
        let status = status_after(&nav, &machine, fix(40.001, -104.998, 0.0, 3));
        assert_eq!(status, NavigatorStatus::TrailLost);
    }

    #[test]
    fn test_invalid_fix_is_an_error() {
        let nav = navigator();
        let staged = StagedTransitions::default();
        let err = nav
            .evaluate_location(&fix(f64::NAN, 0.0, 0.0, 1), &staged)
            .unwrap_err();
        assert!(matches!(err, NavigationError::InvalidFix { .. }));
        assert!(staged.into_inner().is_empty());
    }
}
