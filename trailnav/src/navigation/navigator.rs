//! Contract between the navigation session and a trail evaluator.
//!
//! A [`TrailNavigator`] maps each fix onto a drive and reports the outcome
//! through exactly one [`NavigatorListener`] callback. The listener is passed
//! per call, so the evaluator never owns the state it drives.

use thiserror::Error;

use crate::location::LocationFix;
use crate::trail::WaypointInfo;

/// Payload passed with progress callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationSituation {
    pub next_waypoint: WaypointInfo,
}

/// Errors raised while evaluating a fix.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NavigationError {
    /// No drive and evaluator are bound to the session.
    #[error("No trail drive is bound for navigation")]
    NotBound,

    /// The drive cannot be navigated.
    #[error("Invalid trail drive: {reason}")]
    InvalidDrive { reason: String },

    /// The fix cannot be evaluated.
    #[error("Invalid location fix: {reason}")]
    InvalidFix { reason: String },

    /// The evaluator failed for another reason.
    #[error("Navigation evaluation failed: {0}")]
    Evaluator(String),
}

/// Receiver of evaluator outcomes.
pub trait NavigatorListener {
    /// The fix is on the route, heading for `situation.next_waypoint`.
    fn on_change(&self, fix: &LocationFix, situation: &NavigationSituation);

    /// The fix reached the end of the drive.
    fn on_trail_end_reached(&self, fix: &LocationFix, situation: &NavigationSituation);

    /// The fix is not within tolerance of the route.
    fn on_trail_lost(&self, fix: &LocationFix);

    /// The fix is moving against the drive's direction of travel.
    fn on_wrong_direction(&self, fix: &LocationFix);

    /// The fix was discarded as noise or a duplicate.
    fn on_location_ignored(&self, _fix: &LocationFix) {}
}

/// Trail evaluator.
pub trait TrailNavigator: Send + Sync {
    /// Evaluate one fix, reporting the outcome to `listener`.
    fn evaluate_location(
        &self,
        fix: &LocationFix,
        listener: &dyn NavigatorListener,
    ) -> Result<(), NavigationError>;
}
