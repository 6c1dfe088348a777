//! Navigation status values and their display projection.

use std::fmt;

use crate::trail::{WaypointDirection, WaypointInfo};

/// Classification of the driver's progress along a drive.
///
/// Each variant carries only the data that is meaningful for it, so a next
/// waypoint can never be read while the status is `NotReady`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NavigatorStatus {
    /// No drive and evaluator are bound, or nothing has been evaluated yet.
    #[default]
    NotReady,
    /// On the route, heading for `next_waypoint`.
    Navigating { next_waypoint: WaypointInfo },
    /// The end of the drive was reached at `waypoint`.
    Finished { waypoint: WaypointInfo },
    /// The last fix is not within tolerance of the route.
    TrailLost,
    /// Moving opposite to the expected direction of travel.
    WrongDirection,
}

impl NavigatorStatus {
    /// Short variant name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotReady => "not_ready",
            Self::Navigating { .. } => "navigating",
            Self::Finished { .. } => "finished",
            Self::TrailLost => "trail_lost",
            Self::WrongDirection => "wrong_direction",
        }
    }

    /// Waypoint carried by this status, if any.
    pub fn waypoint(&self) -> Option<&WaypointInfo> {
        match self {
            Self::Navigating { next_waypoint } => Some(next_waypoint),
            Self::Finished { waypoint } => Some(waypoint),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    /// Derive the UI-facing fields for this status.
    pub fn display(&self) -> StatusDisplay {
        match self {
            Self::NotReady => StatusDisplay::text_only("Not ready"),
            Self::TrailLost => StatusDisplay::text_only("Trail lost"),
            Self::WrongDirection => StatusDisplay::text_only("Wrong direction"),
            Self::Navigating { next_waypoint } => StatusDisplay {
                title: next_waypoint.name.clone(),
                distance_text: format_distance(next_waypoint.distance_meters),
                direction_glyph: direction_glyph(next_waypoint.direction).to_string(),
            },
            Self::Finished { waypoint } => StatusDisplay {
                title: format!("Finished: {}", waypoint.name),
                distance_text: format_distance(waypoint.distance_meters),
                direction_glyph: direction_glyph(waypoint.direction).to_string(),
            },
        }
    }
}

impl fmt::Display for NavigatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display = self.display();
        if display.direction_glyph.is_empty() {
            write!(f, "{}", display.title)
        } else {
            write!(
                f,
                "{} {} {}",
                display.direction_glyph, display.title, display.distance_text
            )
        }
    }
}

/// UI-facing projection of a [`NavigatorStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDisplay {
    pub title: String,
    pub distance_text: String,
    pub direction_glyph: String,
}

impl StatusDisplay {
    fn text_only(title: &str) -> Self {
        Self {
            title: title.to_string(),
            distance_text: format_distance(None),
            direction_glyph: String::new(),
        }
    }
}

/// Format a distance as meters under 1 km and tenths of a kilometer above.
pub fn format_distance(meters: Option<f64>) -> String {
    match meters {
        Some(m) if m.is_finite() && m >= 1000.0 => format!("{:.1} km", m / 1000.0),
        Some(m) if m.is_finite() => format!("{} m", m.max(0.0).round() as i64),
        _ => "--".to_string(),
    }
}

/// Glyph shown next to a waypoint for its direction.
pub fn direction_glyph(direction: WaypointDirection) -> &'static str {
    match direction {
        WaypointDirection::AtPoint => "●",
        WaypointDirection::Forward => "↑",
        WaypointDirection::Backward => "↓",
    }
}
